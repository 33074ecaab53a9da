use std::sync::Arc;

use course_core::model::{Chapter, ChapterId, CourseId, Enrollment, UserId};
use course_core::progression::{LearnerView, plan_completion};
use storage::repository::{ChapterProgressRepository, CourseRepository, EnrollmentRepository};

use crate::Clock;
use crate::error::ServiceError;
use crate::locks::AggregateLocks;

/// Records chapter completions and keeps enrollment progress current.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    locks: Arc<AggregateLocks>,
    courses: Arc<dyn CourseRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    chapter_progress: Arc<dyn ChapterProgressRepository>,
}

impl ProgressService {
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

    /// Mark `chapter_id` completed for `user_id`, make the next chapter
    /// reachable and recompute the enrollment's progress.
    ///
    /// Returns `Ok(None)` without writing anything when the user is not
    /// enrolled or the course or chapter is unknown. Repeating the call for a
    /// completed chapter refreshes its completion time and leaves progress
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn complete_chapter(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, ServiceError> {
        let _guard = self.locks.acquire(user_id, course_id).await;

        let Some(mut enrollment) = self.enrollments.get_enrollment(user_id, course_id).await?
        else {
            tracing::debug!(%user_id, %course_id, %chapter_id, "completion ignored: not enrolled");
            return Ok(None);
        };
        let Some(course) = self.courses.get_course(course_id).await? else {
            tracing::debug!(%course_id, "completion ignored: unknown course");
            return Ok(None);
        };
        if !course.contains(chapter_id) {
            tracing::debug!(%course_id, %chapter_id, "completion ignored: chapter not in course");
            return Ok(None);
        }

        let chapter_ids: Vec<ChapterId> = course.chapters().iter().map(Chapter::id).collect();
        let records = self
            .chapter_progress
            .list_chapter_progress(user_id, &chapter_ids)
            .await?;

        let now = self.clock.now();
        let plan = plan_completion(
            &course,
            chapter_id,
            &LearnerView::new(user_id, true, &records),
            now,
        )?;

        self.chapter_progress
            .upsert_chapter_progress(&plan.completed)
            .await?;
        if let Some(next) = &plan.unlocked_next {
            let created = self
                .chapter_progress
                .insert_chapter_progress_if_absent(next)
                .await?;
            if created {
                tracing::debug!(%user_id, chapter_id = %next.chapter_id(), "next chapter reachable");
            }
        }

        let progress = plan.progress;
        enrollment.apply_progress(progress, now);
        self.enrollments.update_enrollment(&enrollment).await?;

        tracing::info!(
            %user_id,
            %course_id,
            %chapter_id,
            progress = progress.value(),
            status = enrollment.status().as_str(),
            "chapter completed"
        );
        Ok(Some(enrollment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{ChapterProgress, Course, CourseStatus, EnrollmentStatus, Progress};
    use course_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    const USER: UserId = UserId::new(2);
    const COURSE: CourseId = CourseId::new(1);

    fn course(chapters: u64) -> Course {
        let chapters = (1..=chapters)
            .map(|n| {
                Chapter::new(
                    ChapterId::new(n),
                    COURSE,
                    u32::try_from(n).unwrap(),
                    format!("Part {n}"),
                    None,
                    None,
                    fixed_now(),
                )
                .unwrap()
            })
            .collect();
        Course::new(
            COURSE,
            "Dumplings",
            None,
            3,
            CourseStatus::Active,
            chapters,
            fixed_now(),
        )
        .unwrap()
    }

    async fn setup(chapters: u64, enrolled: bool) -> (ProgressService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        repo.upsert_course(&course(chapters)).await.unwrap();
        if enrolled {
            repo.insert_enrollment(&Enrollment::new(USER, COURSE, fixed_now()))
                .await
                .unwrap();
        }
        let shared = Arc::new(repo.clone());
        let service = ProgressService::new(
            fixed_clock(),
            Arc::new(AggregateLocks::new()),
            shared.clone(),
            shared.clone(),
            shared,
        );
        (service, repo)
    }

    async fn records(repo: &InMemoryRepository) -> Vec<ChapterProgress> {
        let ids: Vec<ChapterId> = (1..=10).map(ChapterId::new).collect();
        repo.list_chapter_progress(USER, &ids).await.unwrap()
    }

    #[tokio::test]
    async fn completion_unlocks_next_and_updates_progress() {
        let (service, repo) = setup(3, true).await;

        let enrollment = service
            .complete_chapter(USER, ChapterId::new(1), COURSE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress().value(), 33);
        assert_eq!(enrollment.status(), EnrollmentStatus::InProgress);

        let stored = records(&repo).await;
        assert_eq!(stored.len(), 2);
        assert!(stored[0].is_completed());
        assert_eq!(stored[1].chapter_id(), ChapterId::new(2));
        assert!(!stored[1].is_completed());
    }

    #[tokio::test]
    async fn completing_twice_is_idempotent() {
        let (service, repo) = setup(2, true).await;
        let first = service
            .complete_chapter(USER, ChapterId::new(1), COURSE)
            .await
            .unwrap();
        let second = service
            .complete_chapter(USER, ChapterId::new(1), COURSE)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(records(&repo).await.len(), 2);
    }

    #[tokio::test]
    async fn last_chapter_completes_the_course() {
        let (service, repo) = setup(2, true).await;
        service
            .complete_chapter(USER, ChapterId::new(1), COURSE)
            .await
            .unwrap();
        let done = service
            .complete_chapter(USER, ChapterId::new(2), COURSE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.progress(), Progress::COMPLETE);
        assert_eq!(done.status(), EnrollmentStatus::Completed);
        assert_eq!(records(&repo).await.len(), 2);
    }

    #[tokio::test]
    async fn progress_follows_an_extended_chapter_set() {
        let (service, repo) = setup(2, true).await;
        for n in 1..=2 {
            service
                .complete_chapter(USER, ChapterId::new(n), COURSE)
                .await
                .unwrap();
        }
        repo.upsert_course(&course(4)).await.unwrap();

        let enrollment = service
            .complete_chapter(USER, ChapterId::new(2), COURSE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(enrollment.progress().value(), 50);
        assert_eq!(enrollment.status(), EnrollmentStatus::InProgress);

        let stored = records(&repo).await;
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[2].chapter_id(), ChapterId::new(3));
        assert!(!stored[2].is_completed());
    }

    #[tokio::test]
    async fn not_enrolled_writes_nothing() {
        let (service, repo) = setup(2, false).await;
        let outcome = service
            .complete_chapter(USER, ChapterId::new(1), COURSE)
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert!(records(&repo).await.is_empty());
        assert!(repo.get_enrollment(USER, COURSE).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_chapter_or_course_is_ignored() {
        let (service, repo) = setup(2, true).await;
        assert!(
            service
                .complete_chapter(USER, ChapterId::new(99), COURSE)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            service
                .complete_chapter(USER, ChapterId::new(1), CourseId::new(8))
                .await
                .unwrap()
                .is_none()
        );
        assert!(records(&repo).await.is_empty());
    }
}
