use std::sync::Arc;

use course_core::model::{Course, CourseId, Enrollment, UserId};
use course_core::progression::seed_on_join;
use storage::repository::{
    ChapterProgressRepository, CourseRepository, EnrollmentRepository, StorageError,
};

use crate::Clock;
use crate::error::ServiceError;
use crate::locks::AggregateLocks;

/// Creates enrollments and seeds the first chapter's progress record.
#[derive(Clone)]
pub struct EnrollmentService {
    clock: Clock,
    locks: Arc<AggregateLocks>,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    chapter_progress: Arc<dyn ChapterProgressRepository>,
}

impl EnrollmentService {
    #[must_use]
    pub fn new(
        clock: Clock,
        locks: Arc<AggregateLocks>,
        courses: Arc<dyn CourseRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        chapter_progress: Arc<dyn ChapterProgressRepository>,
    ) -> Self {
        Self {
            clock,
            locks,
            courses,
            enrollments,
            chapter_progress,
        }
    }

    /// Enroll `user_id` in `course_id`.
    ///
    /// An existing enrollment is returned unchanged, even when the course has
    /// since been deleted. Otherwise a fresh enrollment at 0% is stored and the
    /// first chapter becomes reachable.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::CourseNotFound` for an unknown course,
    /// `ServiceError::CourseUnavailable` for a deleted one, and
    /// `ServiceError::Storage` if repository access fails.
    pub async fn join(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Enrollment, ServiceError> {
        let _guard = self.locks.acquire(user_id, course_id).await;

        if let Some(existing) = self.enrollments.get_enrollment(user_id, course_id).await? {
            tracing::debug!(%user_id, %course_id, "already enrolled");
            // Repairs an earlier join that stored the enrollment but failed to seed.
            if let Some(course) = self.courses.get_course(course_id).await? {
                self.seed_first_chapter(&course, user_id).await?;
            }
            return Ok(existing);
        }

        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(ServiceError::CourseNotFound(course_id))?;
        if !course.is_active() {
            return Err(ServiceError::CourseUnavailable(course_id));
        }

        let now = self.clock.now();
        let enrollment = Enrollment::new(user_id, course_id, now);
        match self.enrollments.insert_enrollment(&enrollment).await {
            Ok(()) => {}
            // Another process enrolled between our read and write.
            Err(StorageError::Conflict) => {
                return self
                    .enrollments
                    .get_enrollment(user_id, course_id)
                    .await?
                    .ok_or(ServiceError::Storage(StorageError::NotFound));
            }
            Err(err) => return Err(err.into()),
        }

        self.seed_first_chapter(&course, user_id).await?;

        tracing::info!(%user_id, %course_id, "enrolled");
        Ok(enrollment)
    }

    async fn seed_first_chapter(&self, course: &Course, user_id: UserId) -> Result<(), ServiceError> {
        if let Some(first) = seed_on_join(course, user_id, self.clock.now()) {
            let created = self
                .chapter_progress
                .insert_chapter_progress_if_absent(&first)
                .await?;
            if created {
                tracing::debug!(%user_id, chapter_id = %first.chapter_id(), "first chapter reachable");
            }
        }
        Ok(())
    }

    /// Fetch one enrollment. Returns `Ok(None)` when the user never joined.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, ServiceError> {
        Ok(self.enrollments.get_enrollment(user_id, course_id).await?)
    }

    /// All enrollments of a user, ordered by course ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn enrollments_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Enrollment>, ServiceError> {
        Ok(self.enrollments.list_enrollments(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{Chapter, ChapterId, CourseStatus, Progress};
    use course_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    const USER: UserId = UserId::new(1);

    fn course(id: u64, chapters: u64, status: CourseStatus) -> Course {
        let chapters = (1..=chapters)
            .map(|order| {
                Chapter::new(
                    ChapterId::new(id * 100 + order),
                    CourseId::new(id),
                    u32::try_from(order).unwrap(),
                    format!("Chapter {order}"),
                    None,
                    None,
                    fixed_now(),
                )
                .unwrap()
            })
            .collect();
        Course::new(
            CourseId::new(id),
            "Knife Skills",
            None,
            2,
            status,
            chapters,
            fixed_now(),
        )
        .unwrap()
    }

    async fn service_with(courses: &[Course]) -> (EnrollmentService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        for course in courses {
            repo.upsert_course(course).await.unwrap();
        }
        let shared = Arc::new(repo.clone());
        let service = EnrollmentService::new(
            Clock::fixed(fixed_now()),
            Arc::new(AggregateLocks::new()),
            shared.clone(),
            shared.clone(),
            shared,
        );
        (service, repo)
    }

    #[tokio::test]
    async fn join_seeds_first_chapter_only() {
        let (service, repo) = service_with(&[course(1, 3, CourseStatus::Active)]).await;

        let enrollment = service.join(USER, CourseId::new(1)).await.unwrap();
        assert_eq!(enrollment.progress(), Progress::ZERO);

        let records = repo
            .list_chapter_progress(
                USER,
                &[ChapterId::new(101), ChapterId::new(102), ChapterId::new(103)],
            )
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chapter_id(), ChapterId::new(101));
        assert!(!records[0].is_completed());
    }

    #[tokio::test]
    async fn join_twice_returns_the_same_enrollment() {
        let (service, _repo) = service_with(&[course(1, 2, CourseStatus::Active)]).await;
        let first = service.join(USER, CourseId::new(1)).await.unwrap();
        let second = service.join(USER, CourseId::new(1)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.enrollments_for_user(USER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejoin_seeds_first_chapter_left_missing() {
        let (service, repo) = service_with(&[course(1, 2, CourseStatus::Active)]).await;
        let stored = Enrollment::new(USER, CourseId::new(1), fixed_now());
        repo.insert_enrollment(&stored).await.unwrap();

        let joined = service.join(USER, CourseId::new(1)).await.unwrap();
        assert_eq!(joined, stored);

        let records = repo
            .list_chapter_progress(USER, &[ChapterId::new(101), ChapterId::new(102)])
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chapter_id(), ChapterId::new(101));
    }

    #[tokio::test]
    async fn join_course_without_chapters_creates_no_progress() {
        let (service, repo) = service_with(&[course(4, 0, CourseStatus::Active)]).await;
        let enrollment = service.join(USER, CourseId::new(4)).await.unwrap();
        assert_eq!(enrollment.course_id(), CourseId::new(4));
        assert!(
            repo.list_chapter_progress(USER, &[ChapterId::new(401)])
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn join_rejects_unknown_and_deleted_courses() {
        let (service, _repo) = service_with(&[course(2, 1, CourseStatus::Deleted)]).await;

        let err = service.join(USER, CourseId::new(9)).await.unwrap_err();
        assert!(matches!(err, ServiceError::CourseNotFound(id) if id == CourseId::new(9)));

        let err = service.join(USER, CourseId::new(2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::CourseUnavailable(id) if id == CourseId::new(2)));
        assert!(service.enrollment(USER, CourseId::new(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn existing_enrollment_survives_course_deletion() {
        let active = course(3, 1, CourseStatus::Active);
        let (service, repo) = service_with(std::slice::from_ref(&active)).await;
        let joined = service.join(USER, CourseId::new(3)).await.unwrap();

        repo.upsert_course(&active.with_status(CourseStatus::Deleted))
            .await
            .unwrap();
        assert_eq!(service.join(USER, CourseId::new(3)).await.unwrap(), joined);
    }
}
