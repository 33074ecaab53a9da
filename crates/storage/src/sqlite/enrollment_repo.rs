use course_core::model::{CourseId, Enrollment, UserId};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_enrollment_row};
use crate::repository::{EnrollmentRepository, StorageError};

#[async_trait::async_trait]
impl EnrollmentRepository for SqliteRepository {
    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, course_id, progress, status, enrolled_at, updated_at
            FROM enrollments
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_enrollment_row).transpose()
    }

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO enrollments (user_id, course_id, progress, status, enrolled_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(id_to_i64("user_id", enrollment.user_id().value())?)
        .bind(id_to_i64("course_id", enrollment.course_id().value())?)
        .bind(i64::from(enrollment.progress().value()))
        .bind(enrollment.status().as_str())
        .bind(enrollment.enrolled_at())
        .bind(enrollment.updated_at())
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StorageError::Conflict)
            }
            Err(e) => Err(conn(e)),
        }
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE enrollments
            SET progress = ?3, status = ?4, updated_at = ?5
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(id_to_i64("user_id", enrollment.user_id().value())?)
        .bind(id_to_i64("course_id", enrollment.course_id().value())?)
        .bind(i64::from(enrollment.progress().value()))
        .bind(enrollment.status().as_str())
        .bind(enrollment.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, course_id, progress, status, enrolled_at, updated_at
            FROM enrollments
            WHERE user_id = ?1
            ORDER BY course_id ASC
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_enrollment_row).collect()
    }
}
