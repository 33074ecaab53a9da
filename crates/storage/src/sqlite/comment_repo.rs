use course_core::model::{Comment, CommentId, CourseId, NewComment};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_comment_row};
use crate::repository::{CommentRepository, StorageError};

#[async_trait::async_trait]
impl CommentRepository for SqliteRepository {
    async fn insert_comment(&self, comment: &NewComment) -> Result<CommentId, StorageError> {
        let result = sqlx::query(
            r"
            INSERT INTO comments (course_id, user_id, text, rating, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(id_to_i64("course_id", comment.course_id.value())?)
        .bind(id_to_i64("user_id", comment.user_id.value())?)
        .bind(&comment.text)
        .bind(i64::from(comment.rating.value()))
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = u64::try_from(result.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("comment id sign overflow".into()))?;
        Ok(CommentId::new(id))
    }

    async fn list_comments(&self, course_id: CourseId) -> Result<Vec<Comment>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, user_id, text, rating, created_at
            FROM comments
            WHERE course_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_comment_row).collect()
    }
}
