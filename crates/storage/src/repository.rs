use async_trait::async_trait;
use course_core::model::{
    ChapterId, ChapterProgress, Comment, CommentId, Course, CourseId, CourseStatus, Cuisine,
    CuisineId, Enrollment, NewComment, Question, QuizResult, UserId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Narrows a course listing. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseFilter {
    pub status: Option<CourseStatus>,
    pub cuisine_id: Option<CuisineId>,
    pub creator_id: Option<UserId>,
}

impl CourseFilter {
    /// Only courses that are open for enrollment.
    #[must_use]
    pub fn active() -> Self {
        Self {
            status: Some(CourseStatus::Active),
            ..Self::default()
        }
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

    #[must_use]
    pub fn matches(&self, course: &Course) -> bool {
        self.status.is_none_or(|s| course.status() == s)
            && self.cuisine_id.is_none_or(|c| course.cuisine_id() == Some(c))
            && self.creator_id.is_none_or(|u| course.creator_id() == Some(u))
    }
}

/// Catalog of courses and their chapters.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or replace a course together with its chapters.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing course is `Ok(None)`.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// Courses matching `filter`, ordered by ID. The limit applies after
    /// filtering.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_courses(
        &self,
        filter: &CourseFilter,
        limit: u32,
    ) -> Result<Vec<Course>, StorageError>;
}

/// Cuisine categories courses are filed under.
#[async_trait]
pub trait CuisineRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the cuisine cannot be stored.
    async fn upsert_cuisine(&self, cuisine: &Cuisine) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing cuisine is `Ok(None)`.
    async fn get_cuisine(&self, id: CuisineId) -> Result<Option<Cuisine>, StorageError>;

    /// All cuisines ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_cuisines(&self) -> Result<Vec<Cuisine>, StorageError>;
}

/// Rated learner comments on courses.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Append a comment and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the comment cannot be stored.
    async fn insert_comment(&self, comment: &NewComment) -> Result<CommentId, StorageError>;

    /// Comments on a course, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_comments(&self, course_id: CourseId) -> Result<Vec<Comment>, StorageError>;
}

/// (user, course) enrollment records.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures; a missing record is `Ok(None)`.
    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError>;

    /// Insert a new enrollment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the pair is already enrolled.
    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// Overwrite progress and status of an existing enrollment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the pair is not enrolled.
    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError>;

    /// All enrollments of a user, ordered by course ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError>;
}

/// (user, chapter) completion records.
#[async_trait]
pub trait ChapterProgressRepository: Send + Sync {
    /// Insert or overwrite a record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_chapter_progress(&self, record: &ChapterProgress) -> Result<(), StorageError>;

    /// Insert a record only if none exists for its (user, chapter).
    ///
    /// Returns `true` when the record was inserted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn insert_chapter_progress_if_absent(
        &self,
        record: &ChapterProgress,
    ) -> Result<bool, StorageError>;

    /// Records of `user_id` restricted to `chapter_ids`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_chapter_progress(
        &self,
        user_id: UserId,
        chapter_ids: &[ChapterId],
    ) -> Result<Vec<ChapterProgress>, StorageError>;
}

/// Chapter quiz questions and graded attempts.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Questions for a chapter ordered by their `order`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_questions(&self, chapter_id: ChapterId) -> Result<Vec<Question>, StorageError>;

    /// Append a graded attempt and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn insert_quiz_result(&self, result: &QuizResult) -> Result<i64, StorageError>;

    /// Attempts of a user on a chapter, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_quiz_results(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
    ) -> Result<Vec<QuizResult>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    courses: BTreeMap<CourseId, Course>,
    cuisines: BTreeMap<CuisineId, Cuisine>,
    comments: Vec<Comment>,
    enrollments: BTreeMap<(UserId, CourseId), Enrollment>,
    chapter_progress: HashMap<(UserId, ChapterId), ChapterProgress>,
    questions: HashMap<ChapterId, BTreeMap<(u32, u64), Question>>,
    quiz_results: Vec<QuizResult>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        self.lock()?.courses.insert(course.id(), course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        Ok(self.lock()?.courses.get(&id).cloned())
    }

    async fn list_courses(
        &self,
        filter: &CourseFilter,
        limit: u32,
    ) -> Result<Vec<Course>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .courses
            .values()
            .filter(|c| filter.matches(c))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CuisineRepository for InMemoryRepository {
    async fn upsert_cuisine(&self, cuisine: &Cuisine) -> Result<(), StorageError> {
        self.lock()?.cuisines.insert(cuisine.id(), cuisine.clone());
        Ok(())
    }

    async fn get_cuisine(&self, id: CuisineId) -> Result<Option<Cuisine>, StorageError> {
        Ok(self.lock()?.cuisines.get(&id).cloned())
    }

    async fn list_cuisines(&self) -> Result<Vec<Cuisine>, StorageError> {
        let mut cuisines: Vec<Cuisine> = self.lock()?.cuisines.values().cloned().collect();
        cuisines.sort_by(|a, b| a.name().cmp(b.name()).then(a.id().cmp(&b.id())));
        Ok(cuisines)
    }
}

#[async_trait]
impl CommentRepository for InMemoryRepository {
    async fn insert_comment(&self, comment: &NewComment) -> Result<CommentId, StorageError> {
        let mut guard = self.lock()?;
        let next = u64::try_from(guard.comments.len())
            .map_err(|_| StorageError::Serialization("comment id overflow".into()))?
            + 1;
        let id = CommentId::new(next);
        guard.comments.push(Comment::from_new(id, comment.clone()));
        Ok(id)
    }

    async fn list_comments(&self, course_id: CourseId) -> Result<Vec<Comment>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .comments
            .iter()
            .filter(|c| c.course_id() == course_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn get_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        Ok(self.lock()?.enrollments.get(&(user_id, course_id)).cloned())
    }

    async fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let key = (enrollment.user_id(), enrollment.course_id());
        if guard.enrollments.contains_key(&key) {
            return Err(StorageError::Conflict);
        }
        guard.enrollments.insert(key, enrollment.clone());
        Ok(())
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .enrollments
            .get_mut(&(enrollment.user_id(), enrollment.course_id()))
            .ok_or(StorageError::NotFound)?;
        *slot = enrollment.clone();
        Ok(())
    }

    async fn list_enrollments(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .enrollments
            .range((user_id, CourseId::new(0))..=(user_id, CourseId::new(u64::MAX)))
            .map(|(_, e)| e.clone())
            .collect())
    }
}

#[async_trait]
impl ChapterProgressRepository for InMemoryRepository {
    async fn upsert_chapter_progress(&self, record: &ChapterProgress) -> Result<(), StorageError> {
        self.lock()?
            .chapter_progress
            .insert((record.user_id(), record.chapter_id()), record.clone());
        Ok(())
    }

    async fn insert_chapter_progress_if_absent(
        &self,
        record: &ChapterProgress,
    ) -> Result<bool, StorageError> {
        let mut guard = self.lock()?;
        let key = (record.user_id(), record.chapter_id());
        if guard.chapter_progress.contains_key(&key) {
            return Ok(false);
        }
        guard.chapter_progress.insert(key, record.clone());
        Ok(true)
    }

    async fn list_chapter_progress(
        &self,
        user_id: UserId,
        chapter_ids: &[ChapterId],
    ) -> Result<Vec<ChapterProgress>, StorageError> {
        let guard = self.lock()?;
        Ok(chapter_ids
            .iter()
            .filter_map(|chapter_id| guard.chapter_progress.get(&(user_id, *chapter_id)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let per_chapter = guard.questions.entry(question.chapter_id()).or_default();
        per_chapter.retain(|_, q| q.id() != question.id());
        per_chapter.insert((question.order(), question.id().value()), question.clone());
        Ok(())
    }

    async fn list_questions(&self, chapter_id: ChapterId) -> Result<Vec<Question>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .questions
            .get(&chapter_id)
            .map(|qs| qs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_quiz_result(&self, result: &QuizResult) -> Result<i64, StorageError> {
        let mut guard = self.lock()?;
        guard.quiz_results.push(result.clone());
        i64::try_from(guard.quiz_results.len())
            .map_err(|_| StorageError::Serialization("quiz result id overflow".into()))
    }

    async fn list_quiz_results(
        &self,
        user_id: UserId,
        chapter_id: ChapterId,
    ) -> Result<Vec<QuizResult>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .quiz_results
            .iter()
            .filter(|r| r.user_id == user_id && r.chapter_id == chapter_id)
            .cloned()
            .collect())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub cuisines: Arc<dyn CuisineRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub chapter_progress: Arc<dyn ChapterProgressRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            courses: Arc::new(repo.clone()),
            cuisines: Arc::new(repo.clone()),
            comments: Arc::new(repo.clone()),
            enrollments: Arc::new(repo.clone()),
            chapter_progress: Arc::new(repo.clone()),
            quizzes: Arc::new(repo),
        }
    }
}
