use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::chapter::Chapter;
use crate::model::ids::{ChapterId, CourseId, CuisineId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("difficulty must be between 1 and 5, got {0}")]
    InvalidDifficulty(u8),

    #[error("chapter {chapter} belongs to course {actual}, not {expected}")]
    ForeignChapter {
        chapter: ChapterId,
        expected: CourseId,
        actual: CourseId,
    },

    #[error("chapter order {0} appears more than once")]
    DuplicateOrder(u32),

    #[error("chapter id {0} appears more than once")]
    DuplicateChapter(ChapterId),

    #[error("unknown course status: {0}")]
    UnknownStatus(String),

    #[error("course image is not a valid URL: {0}")]
    InvalidImageUrl(String),
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Catalog visibility of a course.
///
/// Deleted courses stay readable so existing enrollments keep working, but
/// they no longer accept new learners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CourseStatus {
    #[default]
    Active,
    Deleted,
}

impl CourseStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CourseStatus::Active => "active",
            CourseStatus::Deleted => "deleted",
        }
    }

    /// Parses the storage representation produced by [`CourseStatus::as_str`].
    ///
    /// # Errors
    ///
    /// Returns `CourseError::UnknownStatus` for anything else.
    pub fn parse(raw: &str) -> Result<Self, CourseError> {
        match raw {
            "active" => Ok(CourseStatus::Active),
            "deleted" => Ok(CourseStatus::Deleted),
            other => Err(CourseError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── COURSE ────────────────────────────────────────────────────────────────────
//

/// Immutable catalog entry: a titled, ordered set of chapters.
///
/// Cuisine, creator, duration and image are optional catalog details set
/// with the `with_*` builders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    title: String,
    description: Option<String>,
    difficulty: u8,
    status: CourseStatus,
    chapters: Vec<Chapter>,
    created_at: DateTime<Utc>,
    cuisine_id: Option<CuisineId>,
    creator_id: Option<UserId>,
    duration: Option<String>,
    image_url: Option<Url>,
}

impl Course {
    /// Creates a course from its chapters, sorting them by `order`.
    ///
    /// Gaps in the order sequence are allowed here; sequencing treats a chapter
    /// whose predecessor is missing as locked.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the title is blank, the difficulty is outside
    /// 1..=5, a chapter belongs to another course, or an order value or chapter
    /// id is duplicated.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: Option<String>,
        difficulty: u8,
        status: CourseStatus,
        mut chapters: Vec<Chapter>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }
        if !(1..=5).contains(&difficulty) {
            return Err(CourseError::InvalidDifficulty(difficulty));
        }

        if let Some(foreign) = chapters.iter().find(|c| c.course_id() != id) {
            return Err(CourseError::ForeignChapter {
                chapter: foreign.id(),
                expected: id,
                actual: foreign.course_id(),
            });
        }

        chapters.sort_by_key(Chapter::order);
        for pair in chapters.windows(2) {
            if pair[0].order() == pair[1].order() {
                return Err(CourseError::DuplicateOrder(pair[0].order()));
            }
        }
        let mut ids: Vec<ChapterId> = chapters.iter().map(Chapter::id).collect();
        ids.sort_unstable();
        for pair in ids.windows(2) {
            if pair[0] == pair[1] {
                return Err(CourseError::DuplicateChapter(pair[0]));
            }
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            difficulty,
            status,
            chapters,
            created_at,
            cuisine_id: None,
            creator_id: None,
            duration: None,
            image_url: None,
        })
    }

    #[must_use]
    pub fn with_cuisine(mut self, cuisine_id: CuisineId) -> Self {
        self.cuisine_id = Some(cuisine_id);
        self
    }

    #[must_use]
    pub fn with_creator(mut self, creator_id: UserId) -> Self {
        self.creator_id = Some(creator_id);
        self
    }

    /// Free-form length such as "45 min". Blank values clear it.
    #[must_use]
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        let duration = duration.into();
        self.duration = Some(duration.trim().to_owned()).filter(|d| !d.is_empty());
        self
    }

    /// # Errors
    ///
    /// Returns `CourseError::InvalidImageUrl` unless `raw` is an absolute URL.
    pub fn with_image_url(mut self, raw: &str) -> Result<Self, CourseError> {
        let raw = raw.trim();
        let url = Url::parse(raw).map_err(|_| CourseError::InvalidImageUrl(raw.to_owned()))?;
        self.image_url = Some(url);
        Ok(self)
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
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
    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    #[must_use]
    pub fn status(&self) -> CourseStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == CourseStatus::Active
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Chapters sorted ascending by `order`.
    #[must_use]
    pub fn cuisine_id(&self) -> Option<CuisineId> {
        self.cuisine_id
    }

    #[must_use]
    pub fn creator_id(&self) -> Option<UserId> {
        self.creator_id
    }

    #[must_use]
    pub fn duration(&self) -> Option<&str> {
        self.duration.as_deref()
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    #[must_use]
    pub fn total_chapters(&self) -> usize {
        self.chapters.len()
    }

    #[must_use]
    pub fn contains(&self, chapter_id: ChapterId) -> bool {
        self.chapter(chapter_id).is_some()
    }

    #[must_use]
    pub fn chapter(&self, chapter_id: ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id() == chapter_id)
    }

    #[must_use]
    pub fn chapter_at(&self, order: u32) -> Option<&Chapter> {
        self.chapters
            .binary_search_by_key(&order, Chapter::order)
            .ok()
            .map(|idx| &self.chapters[idx])
    }

    /// The chapter with `order == 1`, if the course has one.
    #[must_use]
    pub fn first_chapter(&self) -> Option<&Chapter> {
        self.chapter_at(1)
    }

    /// The chapter immediately after `chapter` (`order + 1`).
    #[must_use]
    pub fn next_chapter(&self, chapter: &Chapter) -> Option<&Chapter> {
        chapter
            .order()
            .checked_add(1)
            .and_then(|order| self.chapter_at(order))
    }

    /// The chapter immediately before `chapter` (`order - 1`).
    #[must_use]
    pub fn previous_chapter(&self, chapter: &Chapter) -> Option<&Chapter> {
        chapter
            .order()
            .checked_sub(1)
            .and_then(|order| self.chapter_at(order))
    }

    /// Returns a copy of this course with a different catalog status.
    #[must_use]
    pub fn with_status(mut self, status: CourseStatus) -> Self {
        self.status = status;
        self
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
