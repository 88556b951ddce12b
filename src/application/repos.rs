//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::galaxy::{CarouselRow, GalaxyStatus};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[async_trait]
pub trait GalaxiesRepo: Send + Sync {
    /// Flat join of galaxies with their model files, restricted to `status`.
    ///
    /// Rows come back ordered by galaxy sort, then by model-file association id,
    /// so every galaxy's rows are contiguous.
    async fn list_with_files(&self, status: GalaxyStatus) -> Result<Vec<CarouselRow>, RepoError>;
}
