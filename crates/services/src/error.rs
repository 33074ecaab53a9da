//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::{ChapterId, CommentError, CourseId, QuizError, UserId};
use course_core::progression::ProgressionError;
use storage::repository::StorageError;
use storage::seed::SeedError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the progression, enrollment, catalog, quiz and comment
/// services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("course {0} not found")]
    CourseNotFound(CourseId),
    #[error("course {0} no longer accepts enrollments")]
    CourseUnavailable(CourseId),
    #[error("chapter {0} has no quiz")]
    NoQuiz(ChapterId),
    #[error("user {user_id} is not enrolled in course {course_id}")]
    NotEnrolled { user_id: UserId, course_id: CourseId },
    #[error(transparent)]
    Comment(#[from] CommentError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Seed(#[from] SeedError),
}
