use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::{ChapterId, CourseId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChapterError {
    #[error("chapter title cannot be empty")]
    EmptyTitle,

    #[error("chapter order must be >= 1")]
    InvalidOrder,

    #[error("video reference is not a valid URL: {0}")]
    InvalidVideoUrl(String),
}

//
// ─── CHAPTER ───────────────────────────────────────────────────────────────────
//

/// An ordered unit of instructional content within a course.
///
/// `order` is 1-based and unique within the owning course. The description and
/// video reference are carried along for presentation; sequencing never looks
/// at them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    id: ChapterId,
    course_id: CourseId,
    order: u32,
    title: String,
    description: Option<String>,
    video_url: Option<Url>,
    created_at: DateTime<Utc>,
}

impl Chapter {
    /// Creates a new chapter.
    ///
    /// # Errors
    ///
    /// Returns `ChapterError::EmptyTitle` for blank titles,
    /// `ChapterError::InvalidOrder` when `order` is zero and
    /// `ChapterError::InvalidVideoUrl` when the video reference does not parse.
    pub fn new(
        id: ChapterId,
        course_id: CourseId,
        order: u32,
        title: impl Into<String>,
        description: Option<String>,
        video_url: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ChapterError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ChapterError::EmptyTitle);
        }
        if order == 0 {
            return Err(ChapterError::InvalidOrder);
        }

        let video_url = video_url
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| Url::parse(raw).map_err(|_| ChapterError::InvalidVideoUrl(raw.to_owned())))
            .transpose()?;

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            course_id,
            order,
            title: title.trim().to_owned(),
            description,
            video_url,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ChapterId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    /// 1-based position within the course.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.order == 1
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn video_url(&self) -> Option<&Url> {
        self.video_url.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
