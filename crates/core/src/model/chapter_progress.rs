use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{ChapterId, UserId};

/// Per-user completion record for one chapter.
///
/// A record only exists once the chapter became reachable for the user; it
/// starts incomplete and flips to completed on a completion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterProgress {
    user_id: UserId,
    chapter_id: ChapterId,
    is_completed: bool,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ChapterProgress {
    /// A freshly reachable, not yet completed chapter.
    #[must_use]
    pub fn reachable(user_id: UserId, chapter_id: ChapterId, created_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            chapter_id,
            is_completed: false,
            completed_at: None,
            created_at,
        }
    }

    #[must_use]
    pub fn from_persisted(
        user_id: UserId,
        chapter_id: ChapterId,
        completed_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            chapter_id,
            is_completed: completed_at.is_some(),
            completed_at,
            created_at,
        }
    }

    /// Marks the chapter completed at `at`. Re-completing refreshes the timestamp.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.is_completed = true;
        self.completed_at = Some(at);
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn chapter_id(&self) -> ChapterId {
        self.chapter_id
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    #[test]
    fn completion_sets_flag_and_timestamp() {
        let mut record = ChapterProgress::reachable(UserId::new(1), ChapterId::new(2), fixed_now());
        assert!(!record.is_completed());
        assert_eq!(record.completed_at(), None);

        let later = fixed_now() + Duration::minutes(5);
        record.complete(later);
        assert!(record.is_completed());
        assert_eq!(record.completed_at(), Some(later));
        assert_eq!(record.created_at(), fixed_now());
    }

    #[test]
    fn persisted_completion_follows_timestamp() {
        let record =
            ChapterProgress::from_persisted(UserId::new(1), ChapterId::new(2), None, fixed_now());
        assert!(!record.is_completed());

        let record = ChapterProgress::from_persisted(
            UserId::new(1),
            ChapterId::new(2),
            Some(fixed_now()),
            fixed_now(),
        );
        assert!(record.is_completed());
    }
}
