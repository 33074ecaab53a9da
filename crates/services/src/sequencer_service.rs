use std::sync::Arc;

use course_core::model::{Chapter, ChapterId, ChapterProgress, Course, CourseId, UserId};
use course_core::progression::{self, ChapterStep, LearnerView, ProgressionError};
use storage::repository::{ChapterProgressRepository, CourseRepository, EnrollmentRepository};

use crate::error::ServiceError;

/// Answers "may this learner open this chapter?" from stored state.
///
/// Reads only; never takes the aggregate lock.
#[derive(Clone)]
pub struct SequencerService {
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    chapter_progress: Arc<dyn ChapterProgressRepository>,
}

/// A course plus one learner's records in it.
struct Snapshot {
    course: Course,
    enrolled: bool,
    records: Vec<ChapterProgress>,
}

impl Snapshot {
    fn view(&self, user_id: UserId) -> LearnerView<'_> {
        LearnerView::new(user_id, self.enrolled, &self.records)
    }
}

impl SequencerService {
    #[must_use]
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        chapter_progress: Arc<dyn ChapterProgressRepository>,
    ) -> Self {
        Self {
            courses,
            enrollments,
            chapter_progress,
        }
    }

    async fn snapshot(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Snapshot>, ServiceError> {
        let Some(course) = self.courses.get_course(course_id).await? else {
            return Ok(None);
        };
        let enrolled = self
            .enrollments
            .get_enrollment(user_id, course_id)
            .await?
            .is_some();
        let chapter_ids: Vec<ChapterId> = course.chapters().iter().map(Chapter::id).collect();
        let records = self
            .chapter_progress
            .list_chapter_progress(user_id, &chapter_ids)
            .await?;
        Ok(Some(Snapshot {
            course,
            enrolled,
            records,
        }))
    }

    /// Strict unlock check.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::CourseNotFound` for an unknown course,
    /// `ServiceError::Progression` when the chapter is outside the course or
    /// its predecessor is missing, and `ServiceError::Storage` on repository
    /// failure.
    pub async fn check_unlocked(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
        course_id: CourseId,
    ) -> Result<bool, ServiceError> {
        let snapshot = self
            .snapshot(user_id, course_id)
            .await?
            .ok_or(ServiceError::CourseNotFound(course_id))?;
        Ok(progression::check_unlocked(
            &snapshot.course,
            chapter_id,
            &snapshot.view(user_id),
        )?)
    }

    /// Fail-closed unlock check. Unknown courses, foreign chapters and order
    /// gaps all answer `false`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` only when repository access fails.
    pub async fn is_unlocked(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
        course_id: CourseId,
    ) -> Result<bool, ServiceError> {
        match self.check_unlocked(user_id, chapter_id, course_id).await {
            Ok(unlocked) => Ok(unlocked),
            Err(ServiceError::Progression(ProgressionError::OrderGap { course, order })) => {
                tracing::warn!(%course, order, %chapter_id, "chapter order gap, treating as locked");
                Ok(false)
            }
            Err(err @ (ServiceError::Progression(_) | ServiceError::CourseNotFound(_))) => {
                tracing::debug!(%user_id, %chapter_id, %course_id, error = %err, "treating as locked");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Step indicator for one learner, in chapter order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::CourseNotFound` for an unknown course and
    /// `ServiceError::Storage` on repository failure.
    pub async fn chapter_states(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Vec<ChapterStep>, ServiceError> {
        let snapshot = self
            .snapshot(user_id, course_id)
            .await?
            .ok_or(ServiceError::CourseNotFound(course_id))?;
        Ok(progression::chapter_steps(
            &snapshot.course,
            &snapshot.view(user_id),
        ))
    }
}
