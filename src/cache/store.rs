//! In-process cache-aside store with per-entry expiry.
//!
//! Entries are keyed by string and expire lazily: an expired entry is only
//! noticed (and replaced) by the next access. Concurrent misses on one key are
//! coalesced behind a per-key fill gate so the compute step runs once.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, RwLock},
    time::Duration,
};

use metrics::{counter, histogram};
use tokio::{sync::Mutex as FillGate, time::Instant};
use tracing::debug;

use super::lock::{mutex_lock, rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "carousel_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "carousel_cache_miss_total";
pub(crate) const METRIC_CACHE_FILL_MS: &str = "carousel_cache_fill_ms";

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Keyed value store where each entry lives for a caller-supplied TTL.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    fill_gates: Mutex<HashMap<String, Arc<FillGate<()>>>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            fill_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the value stored under `key` unless it is missing or expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        rw_read(&self.entries, SOURCE, "get")
            .get(key)
            .filter(|entry| entry.is_fresh(now))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key`, valid for `ttl` from now.
    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        rw_write(&self.entries, SOURCE, "insert").insert(key.into(), Entry { value, expires_at });
    }

    /// Number of stored entries, expired ones included until they are replaced.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    /// Cache-aside read: serve a fresh entry, otherwise run `compute`, store its
    /// result for `ttl` and return it.
    ///
    /// A failed compute stores nothing and hands the error back unchanged.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            record_hit(key, "fresh");
            return Ok(value);
        }

        let gate = self.fill_gate(key);
        let _filling = gate.lock().await;

        // Another caller may have filled the slot while we waited on the gate.
        if let Some(value) = self.get(key) {
            record_hit(key, "coalesced");
            return Ok(value);
        }

        debug!(cache = key, outcome = "miss", "computing cache entry");
        counter!(METRIC_CACHE_MISS, "key" => key.to_owned()).increment(1);

        let started = std::time::Instant::now();
        let value = compute().await?;
        histogram!(METRIC_CACHE_FILL_MS, "key" => key.to_owned())
            .record(started.elapsed().as_secs_f64() * 1000.0);

        self.insert(key, value.clone(), ttl);
        Ok(value)
    }

    fn fill_gate(&self, key: &str) -> Arc<FillGate<()>> {
        mutex_lock(&self.fill_gates, SOURCE, "fill_gate")
            .entry(key.to_owned())
            .or_default()
            .clone()
    }
}

fn record_hit(key: &str, path: &'static str) {
    debug!(cache = key, outcome = "hit", path, "serving cached entry");
    counter!(METRIC_CACHE_HIT, "key" => key.to_owned()).increment(1);
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    async fn counted(calls: &AtomicUsize, value: u32) -> Result<u32, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_within_ttl_does_not_recompute() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute("slot", TTL, || counted(&calls, 7))
            .await
            .expect("first compute");
        let second = cache
            .get_or_compute("slot", TTL, || counted(&calls, 8))
            .await
            .expect("cached value");

        assert_eq!(first, 7);
        assert_eq!(second, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recomputes_after_expiry() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);

        cache
            .get_or_compute("slot", TTL, || counted(&calls, 1))
            .await
            .expect("first compute");

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        let still_cached = cache
            .get_or_compute("slot", TTL, || counted(&calls, 2))
            .await
            .expect("cached value");
        assert_eq!(still_cached, 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        let refreshed = cache
            .get_or_compute("slot", TTL, || counted(&calls, 2))
            .await
            .expect("recomputed value");

        assert_eq!(refreshed, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_compute_stores_nothing() {
        let cache: TtlCache<u32> = TtlCache::new();

        let err = cache
            .get_or_compute("slot", TTL, || async { Err::<u32, _>("boom".to_string()) })
            .await
            .expect_err("compute error is returned");

        assert_eq!(err, "boom");
        assert!(cache.get("slot").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_compute_once() {
        let cache = TtlCache::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let slow = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, String>(42u32)
        };

        let (left, right) = tokio::join!(
            cache.get_or_compute("slot", TTL, slow),
            cache.get_or_compute("slot", TTL, slow),
        );

        assert_eq!(left, Ok(42));
        assert_eq!(right, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let cache = TtlCache::new();
        cache.insert("a", 1u32, TTL);
        cache.insert("b", 2u32, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(10)).await;

        assert_eq!(cache.get("a"), Some(1));
        assert!(cache.get("b").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn store_recovers_from_poisoned_lock() {
        let cache: TtlCache<u32> = TtlCache::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.entries.write().expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        cache.insert("slot", 3, TTL);
        assert_eq!(cache.get("slot"), Some(3));
    }
}
