mod chapter;
mod chapter_progress;
mod comment;
mod course;
mod cuisine;
mod enrollment;
mod ids;
mod quiz;

pub use ids::{
    AnswerId, ChapterId, CommentId, CourseId, CuisineId, ParseIdError, QuestionId, UserId,
};

pub use chapter::{Chapter, ChapterError};
pub use chapter_progress::ChapterProgress;
pub use comment::{Comment, CommentError, CourseRating, NewComment, Rating};
pub use course::{Course, CourseError, CourseStatus};
pub use cuisine::{Cuisine, CuisineError};
pub use enrollment::{Enrollment, EnrollmentStatus, Progress, ProgressError};
pub use quiz::{AnswerOption, QuizError, QuizResult, QuizStatus, Question};
