use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{CourseId, UserId};

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("progress must be between 0 and 100, got {0}")]
    OutOfRange(u32),

    #[error("completed count {completed} exceeds total {total}")]
    CountExceedsTotal { completed: usize, total: usize },

    #[error("unknown enrollment status: {0}")]
    UnknownStatus(String),
}

/// Course completion percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const COMPLETE: Progress = Progress(100);

    /// Builds a percentage from a raw value.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::OutOfRange` above 100.
    pub fn new(percent: u32) -> Result<Self, ProgressError> {
        u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .map(Self)
            .ok_or(ProgressError::OutOfRange(percent))
    }

    /// `round(100 * completed / total)`, rounding halves up.
    ///
    /// A course without chapters reports zero progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CountExceedsTotal` if `completed > total`.
    pub fn from_counts(completed: usize, total: usize) -> Result<Self, ProgressError> {
        if completed > total {
            return Err(ProgressError::CountExceedsTotal { completed, total });
        }
        if total == 0 {
            return Ok(Self::ZERO);
        }
        // Integer form of round-half-up: floor((200c + t) / 2t).
        let percent = (200 * completed + total) / (2 * total);
        Self::new(u32::try_from(percent).unwrap_or(100))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self.0 == 100
    }
}

impl TryFrom<u32> for Progress {
    type Error = ProgressError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Progress> for u32 {
    fn from(value: Progress) -> Self {
        u32::from(value.0)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Two-state enrollment status, always derived from progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[default]
    InProgress,
    Completed,
}

impl EnrollmentStatus {
    #[must_use]
    pub fn from_progress(progress: Progress) -> Self {
        if progress.is_complete() {
            EnrollmentStatus::Completed
        } else {
            EnrollmentStatus::InProgress
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EnrollmentStatus::InProgress => "in_progress",
            EnrollmentStatus::Completed => "completed",
        }
    }

    /// # Errors
    ///
    /// Returns `ProgressError::UnknownStatus` for unrecognised text.
    pub fn parse(raw: &str) -> Result<Self, ProgressError> {
        match raw {
            "in_progress" => Ok(EnrollmentStatus::InProgress),
            "completed" => Ok(EnrollmentStatus::Completed),
            other => Err(ProgressError::UnknownStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentStatus::InProgress => f.write_str("In Progress"),
            EnrollmentStatus::Completed => f.write_str("Completed"),
        }
    }
}

//
// ─── ENROLLMENT ────────────────────────────────────────────────────────────────
//

/// Links a user to a course they joined, with derived completion state.
///
/// `status` is never set directly; it follows `progress` through
/// [`Enrollment::apply_progress`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    user_id: UserId,
    course_id: CourseId,
    progress: Progress,
    status: EnrollmentStatus,
    enrolled_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Fresh enrollment at zero progress.
    #[must_use]
    pub fn new(user_id: UserId, course_id: CourseId, enrolled_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            course_id,
            progress: Progress::ZERO,
            status: EnrollmentStatus::InProgress,
            enrolled_at,
            updated_at: enrolled_at,
        }
    }

    /// Rehydrates an enrollment from storage, re-deriving status from progress.
    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        course_id: CourseId,
        progress: Progress,
        enrolled_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            course_id,
            progress,
            status: EnrollmentStatus::from_progress(progress),
            enrolled_at,
            updated_at,
        }
    }

    /// Replaces progress and re-derives status.
    pub fn apply_progress(&mut self, progress: Progress, at: DateTime<Utc>) {
        self.progress = progress;
        self.status = EnrollmentStatus::from_progress(progress);
        self.updated_at = at;
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        self.progress
    }

    #[must_use]
    pub fn status(&self) -> EnrollmentStatus {
        self.status
    }

    #[must_use]
    pub fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
