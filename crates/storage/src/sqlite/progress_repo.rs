use course_core::model::{ChapterId, ChapterProgress, UserId};
use sqlx::{QueryBuilder, Sqlite};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_chapter_progress_row};
use crate::repository::{ChapterProgressRepository, StorageError};

#[async_trait::async_trait]
impl ChapterProgressRepository for SqliteRepository {
    async fn upsert_chapter_progress(&self, record: &ChapterProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO chapter_progress (user_id, chapter_id, is_completed, completed_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, chapter_id) DO UPDATE SET
                is_completed = excluded.is_completed,
                completed_at = excluded.completed_at
            ",
        )
        .bind(id_to_i64("user_id", record.user_id().value())?)
        .bind(id_to_i64("chapter_id", record.chapter_id().value())?)
        .bind(record.is_completed())
        .bind(record.completed_at())
        .bind(record.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn insert_chapter_progress_if_absent(
        &self,
        record: &ChapterProgress,
    ) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO chapter_progress (user_id, chapter_id, is_completed, completed_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, chapter_id) DO NOTHING
            ",
        )
        .bind(id_to_i64("user_id", record.user_id().value())?)
        .bind(id_to_i64("chapter_id", record.chapter_id().value())?)
        .bind(record.is_completed())
        .bind(record.completed_at())
        .bind(record.created_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(res.rows_affected() == 1)
    }

    async fn list_chapter_progress(
        &self,
        user_id: UserId,
        chapter_ids: &[ChapterId],
    ) -> Result<Vec<ChapterProgress>, StorageError> {
        if chapter_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT user_id, chapter_id, is_completed, completed_at, created_at \
             FROM chapter_progress WHERE user_id = ",
        );
        qb.push_bind(id_to_i64("user_id", user_id.value())?);
        qb.push(" AND chapter_id IN (");
        let mut separated = qb.separated(", ");
        for id in chapter_ids {
            separated.push_bind(id_to_i64("chapter_id", id.value())?);
        }
        separated.push_unseparated(") ORDER BY chapter_id ASC");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(conn)?;
        rows.iter().map(map_chapter_progress_row).collect()
    }
}
