use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CuisineId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CuisineError {
    #[error("cuisine name cannot be empty")]
    EmptyName,
}

/// A catalog grouping such as "Chinese" or "Italian".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cuisine {
    id: CuisineId,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Cuisine {
    /// # Errors
    ///
    /// Returns `CuisineError::EmptyName` for a blank name.
    pub fn new(
        id: CuisineId,
        name: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CuisineError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CuisineError::EmptyName);
        }
        Ok(Self {
            id,
            name: name.trim().to_owned(),
            description: description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> CuisineId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
