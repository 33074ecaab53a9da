//! Chapter sequencing and course progress derivation.
//!
//! Everything here is pure: callers load a course and one learner's
//! completion records, ask a question or build a [`CompletionPlan`], and
//! persist the outcome themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{
    Chapter, ChapterId, ChapterProgress, Course, CourseId, Progress, UserId,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressionError {
    #[error("chapter {chapter} is not part of course {course}")]
    ChapterNotFound { course: CourseId, chapter: ChapterId },

    #[error("course {course} has no chapter with order {order}")]
    OrderGap { course: CourseId, order: u32 },
}

//
// ─── LEARNER VIEW ──────────────────────────────────────────────────────────────
//

/// One learner's standing in one course: enrollment flag plus their
/// chapter records.
///
/// Records belonging to other users are ignored, so callers may pass a
/// broader slice without filtering first.
#[derive(Debug, Clone, Copy)]
pub struct LearnerView<'a> {
    user_id: UserId,
    enrolled: bool,
    records: &'a [ChapterProgress],
}

impl<'a> LearnerView<'a> {
    #[must_use]
    pub fn new(user_id: UserId, enrolled: bool, records: &'a [ChapterProgress]) -> Self {
        Self {
            user_id,
            enrolled,
            records,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn is_enrolled(&self) -> bool {
        self.enrolled
    }

    #[must_use]
    pub fn record(&self, chapter_id: ChapterId) -> Option<&'a ChapterProgress> {
        self.records
            .iter()
            .find(|r| r.user_id() == self.user_id && r.chapter_id() == chapter_id)
    }

    #[must_use]
    pub fn is_completed(&self, chapter_id: ChapterId) -> bool {
        self.record(chapter_id)
            .is_some_and(ChapterProgress::is_completed)
    }
}

//
// ─── UNLOCK ────────────────────────────────────────────────────────────────────
//

/// Strict unlock check.
///
/// The first chapter is unlocked iff the learner is enrolled; any later
/// chapter is unlocked iff the chapter at `order - 1` is completed.
///
/// # Errors
///
/// Returns `ProgressionError::ChapterNotFound` when the chapter is not in the
/// course and `ProgressionError::OrderGap` when its predecessor is missing.
pub fn check_unlocked(
    course: &Course,
    chapter_id: ChapterId,
    learner: &LearnerView<'_>,
) -> Result<bool, ProgressionError> {
    let chapter = course
        .chapter(chapter_id)
        .ok_or(ProgressionError::ChapterNotFound {
            course: course.id(),
            chapter: chapter_id,
        })?;

    if chapter.is_first() {
        return Ok(learner.is_enrolled());
    }

    let previous = course
        .previous_chapter(chapter)
        .ok_or(ProgressionError::OrderGap {
            course: course.id(),
            order: chapter.order() - 1,
        })?;

    Ok(learner.is_completed(previous.id()))
}

/// Fail-closed unlock check: unknown chapters and order gaps are locked.
#[must_use]
pub fn is_unlocked(course: &Course, chapter_id: ChapterId, learner: &LearnerView<'_>) -> bool {
    check_unlocked(course, chapter_id, learner).unwrap_or(false)
}

//
// ─── STEP INDICATOR ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChapterState {
    Completed,
    Unlocked,
    Locked,
}

/// One entry of a course's step indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterStep {
    pub chapter_id: ChapterId,
    pub order: u32,
    pub title: String,
    pub state: ChapterState,
}

/// Per-chapter state for one learner, in chapter order.
#[must_use]
pub fn chapter_steps(course: &Course, learner: &LearnerView<'_>) -> Vec<ChapterStep> {
    course
        .chapters()
        .iter()
        .map(|chapter| {
            let state = if learner.is_completed(chapter.id()) {
                ChapterState::Completed
            } else if is_unlocked(course, chapter.id(), learner) {
                ChapterState::Unlocked
            } else {
                ChapterState::Locked
            };
            ChapterStep {
                chapter_id: chapter.id(),
                order: chapter.order(),
                title: chapter.title().to_owned(),
                state,
            }
        })
        .collect()
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// `round(100 * completed / total)` over the course's chapters.
#[must_use]
pub fn course_progress(course: &Course, learner: &LearnerView<'_>) -> Progress {
    let completed: HashSet<ChapterId> = course
        .chapters()
        .iter()
        .map(Chapter::id)
        .filter(|id| learner.is_completed(*id))
        .collect();
    // completed is a subset of the course's chapters, so the count never exceeds the total.
    Progress::from_counts(completed.len(), course.total_chapters()).unwrap_or(Progress::ZERO)
}

/// Record to create when a learner joins: the first chapter, if any.
#[must_use]
pub fn seed_on_join(course: &Course, user_id: UserId, now: DateTime<Utc>) -> Option<ChapterProgress> {
    course
        .first_chapter()
        .map(|first| ChapterProgress::reachable(user_id, first.id(), now))
}

/// Writes implied by one completion event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPlan {
    /// The completed chapter's record, to upsert.
    pub completed: ChapterProgress,
    /// The next chapter's record, present only when it did not exist yet.
    pub unlocked_next: Option<ChapterProgress>,
    /// Progress after applying both writes.
    pub progress: Progress,
}

/// Builds the writes for completing `chapter_id`.
///
/// Completing an already-completed chapter produces the same progress and no
/// new next-chapter record.
///
/// # Errors
///
/// Returns `ProgressionError::ChapterNotFound` if the chapter is not in the
/// course.
pub fn plan_completion(
    course: &Course,
    chapter_id: ChapterId,
    learner: &LearnerView<'_>,
    now: DateTime<Utc>,
) -> Result<CompletionPlan, ProgressionError> {
    let chapter = course
        .chapter(chapter_id)
        .ok_or(ProgressionError::ChapterNotFound {
            course: course.id(),
            chapter: chapter_id,
        })?;

    let mut completed = learner
        .record(chapter_id)
        .cloned()
        .unwrap_or_else(|| ChapterProgress::reachable(learner.user_id(), chapter_id, now));
    completed.complete(now);

    let unlocked_next = course
        .next_chapter(chapter)
        .filter(|next| learner.record(next.id()).is_none())
        .map(|next| ChapterProgress::reachable(learner.user_id(), next.id(), now));

    let mut after: Vec<ChapterProgress> = learner
        .records
        .iter()
        .filter(|r| r.user_id() == learner.user_id() && r.chapter_id() != chapter_id)
        .cloned()
        .collect();
    after.push(completed.clone());
    let progress = course_progress(
        course,
        &LearnerView::new(learner.user_id(), learner.is_enrolled(), &after),
    );

    Ok(CompletionPlan {
        completed,
        unlocked_next,
        progress,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
