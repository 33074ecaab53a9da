use std::sync::Arc;

use course_core::model::{Comment, CourseId, CourseRating, NewComment, Rating, UserId};
use storage::repository::{CommentRepository, CourseRepository, EnrollmentRepository};

use crate::Clock;
use crate::error::ServiceError;

/// Rated learner comments and the course rating derived from them.
#[derive(Clone)]
pub struct CommentService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        comments: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            enrollments,
            comments,
        }
    }

    /// Record a comment with a 1 to 5 star rating.
    ///
    /// Only enrolled users may comment. Deleted courses still accept comments
    /// from their existing learners.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Comment` for blank text or an out-of-range
    /// rating, `ServiceError::CourseNotFound` for an unknown course,
    /// `ServiceError::NotEnrolled` if the user never joined it, and
    /// `ServiceError::Storage` if repository access fails.
    pub async fn add_comment(
        &self,
        user_id: UserId,
        course_id: CourseId,
        text: &str,
        stars: u8,
    ) -> Result<Comment, ServiceError> {
        let rating = Rating::new(stars)?;
        let new = NewComment::new(course_id, user_id, text, rating, self.clock.now())?;

        if self.courses.get_course(course_id).await?.is_none() {
            return Err(ServiceError::CourseNotFound(course_id));
        }
        if self
            .enrollments
            .get_enrollment(user_id, course_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotEnrolled { user_id, course_id });
        }

        let id = self.comments.insert_comment(&new).await?;
        tracing::info!(%user_id, %course_id, comment_id = %id, rating = stars, "comment added");
        Ok(Comment::from_new(id, new))
    }

    /// Comments on a course, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn comments(&self, course_id: CourseId) -> Result<Vec<Comment>, ServiceError> {
        Ok(self.comments.list_comments(course_id).await?)
    }

    /// Average star rating of a course, `None` until someone rates it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn course_rating(
        &self,
        course_id: CourseId,
    ) -> Result<Option<CourseRating>, ServiceError> {
        let comments = self.comments.list_comments(course_id).await?;
        Ok(CourseRating::from_ratings(comments.iter().map(Comment::rating)))
    }
}
