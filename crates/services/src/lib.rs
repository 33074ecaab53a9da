#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod comment_service;
pub mod config;
pub mod enrollment_service;
pub mod error;
pub mod locks;
pub mod progress_service;
pub mod quiz_service;
pub mod sequencer_service;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::CatalogService;
pub use comment_service::CommentService;
pub use config::{DEFAULT_QUIZ_PASS_SCORE, ServiceConfig};
pub use enrollment_service::EnrollmentService;
pub use error::{AppServicesError, ServiceError};
pub use locks::AggregateLocks;
pub use progress_service::ProgressService;
pub use quiz_service::QuizService;
pub use sequencer_service::SequencerService;
