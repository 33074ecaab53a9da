use chrono::{DateTime, Utc};
use course_core::model::{
    Chapter, ChapterId, ChapterProgress, Comment, CommentId, CourseId, Cuisine, CuisineId,
    Enrollment, NewComment, Progress, QuizResult, QuizStatus, Rating, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn get_u64(row: &SqliteRow, field: &'static str) -> Result<u64, StorageError> {
    i64_to_u64(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn get_opt_u64(
    row: &SqliteRow,
    field: &'static str,
) -> Result<Option<u64>, StorageError> {
    row.try_get::<Option<i64>, _>(field)
        .map_err(ser)?
        .map(|v| i64_to_u64(field, v))
        .transpose()
}

pub(crate) fn get_u32(row: &SqliteRow, field: &'static str) -> Result<u32, StorageError> {
    i64_to_u32(field, row.try_get::<i64, _>(field).map_err(ser)?)
}

pub(crate) fn map_chapter_row(row: &SqliteRow) -> Result<Chapter, StorageError> {
    let video_url: Option<String> = row.try_get("video_url").map_err(ser)?;
    Chapter::new(
        ChapterId::new(get_u64(row, "id")?),
        CourseId::new(get_u64(row, "course_id")?),
        get_u32(row, "chapter_order")?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        video_url.as_deref(),
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_cuisine_row(row: &SqliteRow) -> Result<Cuisine, StorageError> {
    Cuisine::new(
        CuisineId::new(get_u64(row, "id")?),
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_comment_row(row: &SqliteRow) -> Result<Comment, StorageError> {
    let stars = u8::try_from(get_u32(row, "rating")?)
        .map_err(|_| StorageError::Serialization("rating overflow".into()))?;
    let new = NewComment::new(
        CourseId::new(get_u64(row, "course_id")?),
        UserId::new(get_u64(row, "user_id")?),
        row.try_get::<String, _>("text").map_err(ser)?,
        Rating::new(stars).map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)?;
    Ok(Comment::from_new(CommentId::new(get_u64(row, "id")?), new))
}

pub(crate) fn map_enrollment_row(row: &SqliteRow) -> Result<Enrollment, StorageError> {
    let progress = Progress::new(get_u32(row, "progress")?).map_err(ser)?;
    Ok(Enrollment::from_persisted(
        UserId::new(get_u64(row, "user_id")?),
        CourseId::new(get_u64(row, "course_id")?),
        progress,
        row.try_get("enrolled_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    ))
}

pub(crate) fn map_chapter_progress_row(row: &SqliteRow) -> Result<ChapterProgress, StorageError> {
    let is_completed: bool = row.try_get("is_completed").map_err(ser)?;
    let completed_at: Option<DateTime<Utc>> = row.try_get("completed_at").map_err(ser)?;
    if is_completed != completed_at.is_some() {
        return Err(StorageError::Serialization(
            "is_completed disagrees with completed_at".into(),
        ));
    }
    Ok(ChapterProgress::from_persisted(
        UserId::new(get_u64(row, "user_id")?),
        ChapterId::new(get_u64(row, "chapter_id")?),
        completed_at,
        row.try_get("created_at").map_err(ser)?,
    ))
}

pub(crate) fn map_quiz_result_row(row: &SqliteRow) -> Result<QuizResult, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    Ok(QuizResult {
        user_id: UserId::new(get_u64(row, "user_id")?),
        chapter_id: ChapterId::new(get_u64(row, "chapter_id")?),
        score: Progress::new(get_u32(row, "score")?).map_err(ser)?,
        status: QuizStatus::parse(&status).map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_ids() {
        assert!(i64_to_u64("course_id", -1).is_err());
        assert_eq!(i64_to_u64("course_id", 7).unwrap(), 7);
    }

    #[test]
    fn rejects_ids_beyond_i64() {
        assert!(id_to_i64("chapter_id", u64::MAX).is_err());
        assert_eq!(id_to_i64("chapter_id", 12).unwrap(), 12);
    }

    #[test]
    fn rejects_out_of_range_u32() {
        assert!(i64_to_u32("chapter_order", i64::from(u32::MAX) + 1).is_err());
    }
}
