use std::sync::Arc;

use course_core::model::{Course, CourseId, Cuisine, CuisineId, UserId};
use storage::repository::{CourseFilter, CourseRepository, CuisineRepository};

use crate::error::ServiceError;

/// Read and write access to the course catalog.
#[derive(Clone)]
pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
    cuisines: Arc<dyn CuisineRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>, cuisines: Arc<dyn CuisineRepository>) -> Self {
        Self { courses, cuisines }
    }

    /// Insert or replace a cuisine.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if persistence fails.
    pub async fn add_cuisine(&self, cuisine: &Cuisine) -> Result<(), ServiceError> {
        self.cuisines.upsert_cuisine(cuisine).await?;
        tracing::info!(cuisine_id = %cuisine.id(), name = cuisine.name(), "cuisine saved");
        Ok(())
    }

    /// All cuisines ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn cuisines(&self) -> Result<Vec<Cuisine>, ServiceError> {
        Ok(self.cuisines.list_cuisines().await?)
    }

    /// Insert or replace a course together with its chapters.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if persistence fails.
    pub async fn add_course(&self, course: &Course) -> Result<(), ServiceError> {
        self.courses.upsert_course(course).await?;
        tracing::info!(
            course_id = %course.id(),
            chapters = course.total_chapters(),
            "course saved"
        );
        Ok(())
    }

    /// Fetch a course by ID, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn course(&self, course_id: CourseId) -> Result<Option<Course>, ServiceError> {
        Ok(self.courses.get_course(course_id).await?)
    }

    /// Active courses ordered by ID, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn active_courses(&self, limit: u32) -> Result<Vec<Course>, ServiceError> {
        Ok(self.courses.list_courses(&CourseFilter::active(), limit).await?)
    }

    /// Active courses filed under `cuisine_id`, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn courses_by_cuisine(
        &self,
        cuisine_id: CuisineId,
        limit: u32,
    ) -> Result<Vec<Course>, ServiceError> {
        let filter = CourseFilter::active().with_cuisine(cuisine_id);
        Ok(self.courses.list_courses(&filter, limit).await?)
    }

    /// Active courses authored by `creator_id`, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Storage` if repository access fails.
    pub async fn courses_by_creator(
        &self,
        creator_id: UserId,
        limit: u32,
    ) -> Result<Vec<Course>, ServiceError> {
        let filter = CourseFilter::active().with_creator(creator_id);
        Ok(self.courses.list_courses(&filter, limit).await?)
    }
}
