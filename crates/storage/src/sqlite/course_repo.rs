use course_core::model::{Course, CourseId, CourseStatus, CuisineId, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::SqliteRepository;
use super::mapping::{conn, get_opt_u64, get_u32, get_u64, id_to_i64, map_chapter_row, ser};
use crate::repository::{CourseFilter, CourseRepository, StorageError};

const COURSE_COLUMNS: &str = "id, title, description, difficulty, status, created_at, \
     cuisine_id, creator_id, duration, image_url";

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let course_id = id_to_i64("course_id", course.id().value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO courses (
                id, title, description, difficulty, status, created_at,
                cuisine_id, creator_id, duration, image_url
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                difficulty = excluded.difficulty,
                status = excluded.status,
                cuisine_id = excluded.cuisine_id,
                creator_id = excluded.creator_id,
                duration = excluded.duration,
                image_url = excluded.image_url
            ",
        )
        .bind(course_id)
        .bind(course.title())
        .bind(course.description())
        .bind(i64::from(course.difficulty()))
        .bind(course.status().as_str())
        .bind(course.created_at())
        .bind(
            course
                .cuisine_id()
                .map(|c| id_to_i64("cuisine_id", c.value()))
                .transpose()?,
        )
        .bind(
            course
                .creator_id()
                .map(|u| id_to_i64("creator_id", u.value()))
                .transpose()?,
        )
        .bind(course.duration())
        .bind(course.image_url().map(|u| u.as_str().to_owned()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // Free every order slot first so reordered chapters do not trip the
        // (course_id, chapter_order) unique constraint mid-update.
        sqlx::query("UPDATE chapters SET chapter_order = -id WHERE course_id = ?1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for chapter in course.chapters() {
            sqlx::query(
                r"
                INSERT INTO chapters (id, course_id, chapter_order, title, description, video_url, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    course_id = excluded.course_id,
                    chapter_order = excluded.chapter_order,
                    title = excluded.title,
                    description = excluded.description,
                    video_url = excluded.video_url
                ",
            )
            .bind(id_to_i64("chapter_id", chapter.id().value())?)
            .bind(course_id)
            .bind(i64::from(chapter.order()))
            .bind(chapter.title())
            .bind(chapter.description())
            .bind(chapter.video_url().map(|u| u.as_str().to_owned()))
            .bind(chapter.created_at())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        sqlx::query("DELETE FROM chapters WHERE course_id = ?1 AND chapter_order < 1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("course_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        match row {
            Some(row) => self.course_from_row(&row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn list_courses(
        &self,
        filter: &CourseFilter,
        limit: u32,
    ) -> Result<Vec<Course>, StorageError> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {COURSE_COLUMNS} FROM courses WHERE 1 = 1"));
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(cuisine_id) = filter.cuisine_id {
            qb.push(" AND cuisine_id = ")
                .push_bind(id_to_i64("cuisine_id", cuisine_id.value())?);
        }
        if let Some(creator_id) = filter.creator_id {
            qb.push(" AND creator_id = ")
                .push_bind(id_to_i64("creator_id", creator_id.value())?);
        }
        qb.push(" ORDER BY id ASC LIMIT ").push_bind(i64::from(limit));

        let rows = qb.build().fetch_all(&self.pool).await.map_err(conn)?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            courses.push(self.course_from_row(&row).await?);
        }
        Ok(courses)
    }
}

impl SqliteRepository {
    async fn course_from_row(&self, row: &SqliteRow) -> Result<Course, StorageError> {
        let id = CourseId::new(get_u64(row, "id")?);
        let chapter_rows = sqlx::query(
            r"
            SELECT id, course_id, chapter_order, title, description, video_url, created_at
            FROM chapters
            WHERE course_id = ?1
            ORDER BY chapter_order ASC
            ",
        )
        .bind(id_to_i64("course_id", id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let chapters = chapter_rows
            .iter()
            .map(map_chapter_row)
            .collect::<Result<Vec<_>, _>>()?;

        let difficulty = u8::try_from(get_u32(row, "difficulty")?)
            .map_err(|_| StorageError::Serialization("difficulty overflow".into()))?;
        let status: String = row.try_get("status").map_err(ser)?;

        let mut course = Course::new(
            id,
            row.try_get::<String, _>("title").map_err(ser)?,
            row.try_get::<Option<String>, _>("description").map_err(ser)?,
            difficulty,
            CourseStatus::parse(&status).map_err(ser)?,
            chapters,
            row.try_get("created_at").map_err(ser)?,
        )
        .map_err(ser)?;

        if let Some(cuisine_id) = get_opt_u64(row, "cuisine_id")? {
            course = course.with_cuisine(CuisineId::new(cuisine_id));
        }
        if let Some(creator_id) = get_opt_u64(row, "creator_id")? {
            course = course.with_creator(UserId::new(creator_id));
        }
        if let Some(duration) = row.try_get::<Option<String>, _>("duration").map_err(ser)? {
            course = course.with_duration(duration);
        }
        if let Some(image_url) = row.try_get::<Option<String>, _>("image_url").map_err(ser)? {
            course = course.with_image_url(&image_url).map_err(ser)?;
        }
        Ok(course)
    }
}
