//! In-memory TTL cache with bounded capacity
//!
//! `ApiCache` is a key/value store for JSON responses:
//! - per-entry TTL with lazy expiry on read
//! - capacity cap: inserting a new key at capacity evicts exactly one
//!   oldest-inserted entry (a bounded-memory safety valve, not an LRU)
//! - `request()` read-through over an async producer
//! - a periodic sweep task that purges expired entries for cold keys
//!
//! Concurrent misses on the same key are NOT deduplicated: each caller
//! runs the producer and the last write wins. Upstream calls are
//! idempotent reads, so this only costs a duplicate request.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::config::ApiCacheConfig;
use super::entry::CacheEntry;
use super::error::CacheError;

/// Options for a single read-through request
#[derive(Debug, Clone)]
pub struct CacheOptions<'a> {
    /// Composite, human-readable key identifying the logical operation
    pub key: &'a str,
    /// How long the produced value stays servable; `None` falls back to
    /// the cache's configured default TTL
    pub ttl: Option<Duration>,
    /// Run the producer even on a hit; the result still repopulates the cache
    pub skip_cache: bool,
}

impl<'a> CacheOptions<'a> {
    pub fn new(key: &'a str, ttl: Duration) -> Self {
        Self {
            key,
            ttl: Some(ttl),
            skip_cache: false,
        }
    }

    /// Cache under the configured default TTL.
    pub fn with_default_ttl(key: &'a str) -> Self {
        Self {
            key,
            ttl: None,
            skip_cache: false,
        }
    }
}

/// Point-in-time cache counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently stored, expired ones included until swept
    pub size: usize,
    /// Configured capacity
    pub max_entries: usize,
    /// Stored entries that are already past their deadline
    pub expired: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    // insertion order for capacity eviction; deleted keys linger here
    // until eviction or sweep skips past them
    order: VecDeque<String>,
}

impl CacheInner {
    fn evict_oldest(&mut self) {
        while let Some(key) = self.order.pop_front() {
            if self.entries.remove(&key).is_some() {
                tracing::debug!(key = %key, "evicted oldest cache entry at capacity");
                break;
            }
        }
    }
}

pub struct ApiCache {
    inner: Mutex<CacheInner>,
    config: ApiCacheConfig,
}

impl ApiCache {
    pub fn new(config: ApiCacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            config,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ApiCacheConfig::default())
    }

    pub fn config(&self) -> &ApiCacheConfig {
        &self.config
    }

    /// Get a stored value. A found-but-expired entry counts as a miss
    /// and is removed on the spot.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.lock();
        match inner.entries.get(key) {
            None => return None,
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => {}
        }
        // lazy expiry: the entry exists but is past its deadline
        inner.entries.remove(key);
        None
    }

    /// Store a value under `key` for `ttl`. Replacing an existing key
    /// keeps its insertion position; a new key at capacity first evicts
    /// the oldest-inserted entry.
    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        let mut inner = self.inner.lock();
        if inner.entries.contains_key(key) {
            inner.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
            return;
        }
        if inner.entries.len() >= self.config.max_entries {
            inner.evict_oldest();
        }
        inner.order.push_back(key.to_string());
        inner.entries.insert(key.to_string(), CacheEntry::new(value, ttl));
    }

    /// True if `key` holds an unexpired value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove one entry. Returns whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        inner.entries.remove(key).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.entries.len(),
            max_entries: self.config.max_entries,
            expired: inner.entries.values().filter(|e| e.is_expired()).count(),
        }
    }

    /// Read-through helper: return the cached value for `options.key`,
    /// or run `producer`, cache its result and return it. A failed
    /// producer caches nothing. With `skip_cache` the producer always
    /// runs and its result still lands in the cache so later reads
    /// benefit.
    pub async fn request<T, E, F, Fut>(&self, producer: F, options: CacheOptions<'_>) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !options.skip_cache {
            if let Some(value) = self.get(options.key) {
                return serde_json::from_value(value)
                    .map_err(|e| E::from(CacheError::from(e)));
            }
        }

        let result = producer().await?;

        let value = serde_json::to_value(&result).map_err(|e| E::from(CacheError::from(e)))?;
        let ttl = options.ttl.unwrap_or_else(|| self.config.default_ttl());
        self.set(options.key, value, ttl);
        Ok(result)
    }

    /// Remove every expired entry, returning how many were dropped.
    /// Runs from the sweep task but is also callable directly.
    pub fn remove_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - inner.entries.len();
        if removed > 0 {
            let CacheInner { entries, order } = &mut *inner;
            order.retain(|key| entries.contains_key(key));
        }
        removed
    }

    /// Spawn the periodic sweep. The caller owns the returned task and
    /// decides its lifetime; dropping it stops the sweep.
    pub fn start_sweep(self: Arc<Self>) -> SweepTask {
        let period = self.config.sweep_interval();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick fires immediately; skip it so sweeps start
            // one full period after launch
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = self.remove_expired();
                if removed > 0 {
                    tracing::debug!(removed, "cache sweep removed expired entries");
                }
            }
        });
        SweepTask { handle }
    }
}

/// Handle to the background sweep; aborts the task when dropped.
pub struct SweepTask {
    handle: JoinHandle<()>,
}

impl SweepTask {
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SweepTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn small_cache(max_entries: usize) -> ApiCache {
        ApiCache::new(ApiCacheConfig {
            default_ttl_secs: 600,
            max_entries,
            sweep_interval_secs: 300,
        })
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let cache = ApiCache::with_defaults();
        cache.set("k", json!({"a": 1}), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
    }

    #[test]
    fn test_get_missing_key_returns_none() {
        let cache = ApiCache::with_defaults();
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_gets_removed() {
        let cache = ApiCache::with_defaults();
        cache.set("k", json!(1), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("k"), None);
        // the lazy expiry also dropped the entry
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_value_stays_servable_until_ttl_elapses() {
        let cache = ApiCache::with_defaults();
        cache.set("k", json!("v"), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!("v")));
        assert_eq!(cache.get("k"), Some(json!("v")));
    }

    #[test]
    fn test_capacity_overflow_evicts_exactly_one_oldest_entry() {
        let cache = small_cache(3);
        cache.set("first", json!(1), Duration::from_secs(60));
        cache.set("second", json!(2), Duration::from_secs(60));
        cache.set("third", json!(3), Duration::from_secs(60));
        cache.set("fourth", json!(4), Duration::from_secs(60));

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some(json!(2)));
        assert_eq!(cache.get("third"), Some(json!(3)));
        assert_eq!(cache.get("fourth"), Some(json!(4)));
    }

    #[test]
    fn test_replacing_existing_key_at_capacity_does_not_evict() {
        let cache = small_cache(2);
        cache.set("a", json!(1), Duration::from_secs(60));
        cache.set("b", json!(2), Duration::from_secs(60));
        cache.set("a", json!(10), Duration::from_secs(60));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), Some(json!(10)));
        assert_eq!(cache.get("b"), Some(json!(2)));
    }

    #[test]
    fn test_eviction_skips_keys_deleted_earlier() {
        let cache = small_cache(3);
        cache.set("a", json!(1), Duration::from_secs(60));
        cache.set("b", json!(2), Duration::from_secs(60));
        cache.set("c", json!(3), Duration::from_secs(60));
        cache.delete("a");
        cache.set("d", json!(4), Duration::from_secs(60));
        // capacity reached again; "a" is long gone, so "b" is the oldest
        cache.set("e", json!(5), Duration::from_secs(60));

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(json!(3)));
        assert_eq!(cache.get("d"), Some(json!(4)));
        assert_eq!(cache.get("e"), Some(json!(5)));
    }

    #[test]
    fn test_delete_reports_existence() {
        let cache = ApiCache::with_defaults();
        cache.set("k", json!(1), Duration::from_secs(60));
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
    }

    #[test]
    fn test_clear_removes_everything() {
        let cache = ApiCache::with_defaults();
        cache.set("a", json!(1), Duration::from_secs(60));
        cache.set("b", json!(2), Duration::from_secs(60));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_stats_counts_size_and_expired() {
        let cache = small_cache(10);
        cache.set("fresh", json!(1), Duration::from_secs(60));
        cache.set("stale", json!(2), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(20));

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.max_entries, 10);
        assert_eq!(stats.expired, 1);
    }

    #[test]
    fn test_remove_expired_only_drops_stale_entries() {
        let cache = ApiCache::with_defaults();
        cache.set("fresh", json!(1), Duration::from_secs(60));
        cache.set("stale1", json!(2), Duration::from_millis(5));
        cache.set("stale2", json!(3), Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.remove_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_request_returns_cached_value_without_calling_producer_again() {
        let cache = ApiCache::with_defaults();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let value: Result<u32, CacheError> = cache
                .request(
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(42)
                    },
                    CacheOptions::new("answer", Duration::from_secs(60)),
                )
                .await;
            assert_eq!(value.unwrap(), 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_reruns_producer_after_expiry() {
        let cache = ApiCache::with_defaults();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let _: Result<u32, CacheError> = cache
                .request(
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(1)
                    },
                    CacheOptions::new("short", Duration::from_millis(5)),
                )
                .await;
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_request_with_skip_cache_still_populates_the_cache() {
        let cache = ApiCache::with_defaults();
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let options = CacheOptions {
            key: "k",
            ttl: Some(Duration::from_secs(60)),
            skip_cache: true,
        };
        let _: Result<u32, CacheError> = cache
            .request(
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                },
                options,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        // a later plain read is served from the cache
        let value: Result<u32, CacheError> = cache
            .request(
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(0)
                },
                CacheOptions::new("k", Duration::from_secs(60)),
            )
            .await;
        assert_eq!(value.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_request_without_ttl_uses_the_configured_default() {
        let cache = ApiCache::new(ApiCacheConfig {
            default_ttl_secs: 0,
            max_entries: 10,
            sweep_interval_secs: 300,
        });

        let _: Result<u32, CacheError> = cache
            .request(|| async { Ok(5) }, CacheOptions::with_default_ttl("k"))
            .await;

        // zero default TTL expires the entry immediately
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test]
    async fn test_failed_producer_leaves_no_entry_behind() {
        let cache = ApiCache::with_defaults();

        let result: Result<u32, CacheError> = cache
            .request(
                || async { Err(CacheError::Serialization("boom".into())) },
                CacheOptions::new("k", Duration::from_secs(60)),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test]
    async fn test_sweep_task_purges_expired_entries() {
        let cache = Arc::new(ApiCache::new(ApiCacheConfig {
            default_ttl_secs: 600,
            max_entries: 10,
            sweep_interval_secs: 1,
        }));
        cache.set("stale", json!(1), Duration::from_millis(10));

        let task = Arc::clone(&cache).start_sweep();
        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert_eq!(cache.len(), 0);
        assert!(!task.is_finished());
        task.stop();
    }

    #[tokio::test]
    async fn test_dropping_sweep_task_stops_the_loop() {
        let cache = Arc::new(ApiCache::with_defaults());
        let task = Arc::clone(&cache).start_sweep();
        drop(task);
        // nothing to assert beyond "does not hang"; the abort is immediate
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
