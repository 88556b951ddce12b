//! Carousel read cache.
//!
//! A cache-aside store sits beside the database: a miss runs the fetch and
//! fold, the result is kept for the configured TTL, and every request inside
//! that window is served from memory.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! ttl_seconds = 3600
//! key = "carousel_data_v1"
//! ```

mod config;
mod lock;
mod store;

pub use config::CacheConfig;
pub(crate) use config::{DEFAULT_KEY, DEFAULT_TTL_SECS};
pub(crate) use store::{METRIC_CACHE_FILL_MS, METRIC_CACHE_HIT, METRIC_CACHE_MISS};
pub use store::TtlCache;
