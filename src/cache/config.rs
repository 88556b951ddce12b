//! Cache configuration.
//!
//! Controls the carousel read cache via `carousel.toml` (`[cache]` table).

use std::time::Duration;

pub(crate) const DEFAULT_TTL_SECS: u64 = 3600;
pub(crate) const DEFAULT_KEY: &str = "carousel_data_v1";

/// Lifetime and slot name of the cached carousel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a computed carousel stays valid; also the shared-cache `s-maxage`.
    pub ttl: Duration,
    /// Key of the single slot holding the carousel. Bump it to orphan stale
    /// entries after a shape change.
    pub key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl: settings.ttl,
            key: settings.key.clone(),
        }
    }
}

impl CacheConfig {
    /// TTL in whole seconds, as used by `Cache-Control` directives.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert_eq!(config.ttl_secs(), 3600);
        assert_eq!(config.key, "carousel_data_v1");
    }
}
