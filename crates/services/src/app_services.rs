use std::sync::Arc;

use storage::repository::Storage;
use storage::seed::{SeedSummary, seed_demo_catalog};

use crate::catalog_service::CatalogService;
use crate::comment_service::CommentService;
use crate::config::ServiceConfig;
use crate::enrollment_service::EnrollmentService;
use crate::error::AppServicesError;
use crate::locks::AggregateLocks;
use crate::progress_service::ProgressService;
use crate::quiz_service::QuizService;
use crate::sequencer_service::SequencerService;
use crate::Clock;

/// Assembles the app-facing services over one storage backend.
///
/// Enrollment and progress writers share one lock registry so `join` and
/// `complete_chapter` on the same (user, course) never interleave.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    storage: Storage,
    catalog: Arc<CatalogService>,
    comments: Arc<CommentService>,
    enrollments: Arc<EnrollmentService>,
    sequencer: Arc<SequencerService>,
    progress: Arc<ProgressService>,
    quizzes: Arc<QuizService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sqlite` if connecting or migrating fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: ServiceConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock, config))
    }

    /// Build services over fresh in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, config: ServiceConfig) -> Self {
        Self::from_storage(Storage::in_memory(), clock, config)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock, config: ServiceConfig) -> Self {
        let locks = Arc::new(AggregateLocks::new());

        let catalog = Arc::new(CatalogService::new(
            Arc::clone(&storage.courses),
            Arc::clone(&storage.cuisines),
        ));
        let comments = Arc::new(CommentService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.comments),
        ));
        let enrollments = Arc::new(EnrollmentService::new(
            clock,
            Arc::clone(&locks),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.chapter_progress),
        ));
        let sequencer = Arc::new(SequencerService::new(
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.chapter_progress),
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            locks,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.enrollments),
            Arc::clone(&storage.chapter_progress),
        ));
        let quizzes = Arc::new(QuizService::new(
            clock,
            config,
            Arc::clone(&storage.quizzes),
        ));

        Self {
            clock,
            storage,
            catalog,
            comments,
            enrollments,
            sequencer,
            progress,
            quizzes,
        }
    }

    /// Load the built-in demo catalog. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Seed` if validation or persistence fails.
    pub async fn seed_demo(&self) -> Result<SeedSummary, AppServicesError> {
        Ok(seed_demo_catalog(&self.storage, self.clock.now()).await?)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn comments(&self) -> Arc<CommentService> {
        Arc::clone(&self.comments)
    }

    #[must_use]
    pub fn enrollments(&self) -> Arc<EnrollmentService> {
        Arc::clone(&self.enrollments)
    }

    #[must_use]
    pub fn sequencer(&self) -> Arc<SequencerService> {
        Arc::clone(&self.sequencer)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn quizzes(&self) -> Arc<QuizService> {
        Arc::clone(&self.quizzes)
    }
}
