use std::sync::Arc;

use axum::http::StatusCode;
use tracing::debug;

use crate::application::error::HttpError;
use crate::application::repos::{GalaxiesRepo, RepoError};
use crate::cache::{CacheConfig, TtlCache};
use crate::domain::galaxy::{CarouselEntry, GalaxyStatus, aggregate};

const SOURCE: &str = "application::carousel::CarouselService";

/// Aggregated carousel shared between the cache and in-flight requests.
pub type Carousel = Arc<Vec<CarouselEntry>>;

#[derive(Clone)]
pub struct CarouselService {
    galaxies: Arc<dyn GalaxiesRepo>,
    cache: Arc<TtlCache<Carousel>>,
    config: CacheConfig,
}

impl CarouselService {
    pub fn new(
        galaxies: Arc<dyn GalaxiesRepo>,
        cache: Arc<TtlCache<Carousel>>,
        config: CacheConfig,
    ) -> Self {
        Self {
            galaxies,
            cache,
            config,
        }
    }

    pub fn cache_config(&self) -> &CacheConfig {
        &self.config
    }

    /// Published galaxies with their files, served from cache while fresh.
    pub async fn load(&self) -> Result<Carousel, HttpError> {
        self.cache
            .get_or_compute(&self.config.key, self.config.ttl, || self.compute())
            .await
    }

    async fn compute(&self) -> Result<Carousel, HttpError> {
        let rows = self
            .galaxies
            .list_with_files(GalaxyStatus::Published)
            .await
            .map_err(|err| repo_failure("list_with_files", err))?;

        let row_count = rows.len();
        let entries = aggregate(rows);
        debug!(
            rows = row_count,
            galaxies = entries.len(),
            "aggregated carousel"
        );

        Ok(Arc::new(entries))
    }
}

fn repo_failure(operation: &'static str, err: RepoError) -> HttpError {
    HttpError::new(
        SOURCE,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to load carousel",
        format!("{operation} failed: {err}"),
    )
}
