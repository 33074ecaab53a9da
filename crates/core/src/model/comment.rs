use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::{CommentId, CourseId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CommentError {
    #[error("comment text cannot be empty")]
    EmptyText,

    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
}

//
// ─── RATING ────────────────────────────────────────────────────────────────────
//

/// Star rating, 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// # Errors
    ///
    /// Returns `CommentError::InvalidRating` outside 1..=5.
    pub fn new(stars: u8) -> Result<Self, CommentError> {
        if (1..=5).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(CommentError::InvalidRating(stars))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = CommentError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

//
// ─── COMMENTS ──────────────────────────────────────────────────────────────────
//

/// A validated comment that storage has not assigned an id to yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub course_id: CourseId,
    pub user_id: UserId,
    pub text: String,
    pub rating: Rating,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    /// # Errors
    ///
    /// Returns `CommentError::EmptyText` for blank text.
    pub fn new(
        course_id: CourseId,
        user_id: UserId,
        text: impl Into<String>,
        rating: Rating,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CommentError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(CommentError::EmptyText);
        }
        Ok(Self {
            course_id,
            user_id,
            text: text.trim().to_owned(),
            rating,
            created_at,
        })
    }
}

/// A learner's rated comment on a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    course_id: CourseId,
    user_id: UserId,
    text: String,
    rating: Rating,
    created_at: DateTime<Utc>,
}

impl Comment {
    #[must_use]
    pub fn from_new(id: CommentId, new: NewComment) -> Self {
        Self {
            id,
            course_id: new.course_id,
            user_id: new.user_id,
            text: new.text,
            rating: new.rating,
            created_at: new.created_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> CommentId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn rating(&self) -> Rating {
        self.rating
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Average star rating over a course's comments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CourseRating {
    pub count: u32,
    pub average: f64,
}

impl CourseRating {
    /// `None` when there is nothing to average.
    #[must_use]
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Option<Self> {
        let (count, total) = ratings
            .into_iter()
            .fold((0_u32, 0_u32), |(count, total), r| {
                (count.saturating_add(1), total.saturating_add(u32::from(r.value())))
            });
        if count == 0 {
            return None;
        }
        Some(Self {
            count,
            average: f64::from(total) / f64::from(count),
        })
    }
}

impl fmt::Display for CourseRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}/5 ({} ratings)", self.average, self.count)
    }
}
