use thiserror::Error;

use crate::model::{
    ChapterError, CommentError, CourseError, CuisineError, ProgressError, QuizError,
};
use crate::progression::ProgressionError;

/// Umbrella over the domain validation errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Chapter(#[from] ChapterError),
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Cuisine(#[from] CuisineError),
    #[error(transparent)]
    Comment(#[from] CommentError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
}
