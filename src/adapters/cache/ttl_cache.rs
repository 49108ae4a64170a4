//! String-keyed TTL cache
//!
//! Every entry carries its own TTL. Expired entries are dropped by a linear
//! sweep when the cache fills up; if the sweep frees nothing the oldest entry
//! goes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache entry with TTL tracking
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    /// Check if entry is still valid
    pub fn is_valid(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }

    /// Get time remaining before expiry
    pub fn time_remaining(&self) -> Option<Duration> {
        self.ttl.checked_sub(self.inserted_at.elapsed()).filter(|d| !d.is_zero())
    }
}

#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Default TTL (60 seconds)
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
    /// Default max cache entries
    pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

    pub fn new() -> Self {
        Self::with_config(Self::DEFAULT_TTL, Self::DEFAULT_MAX_ENTRIES)
    }

    pub fn with_config(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store a value under the default TTL
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, value, ttl);
    }

    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.cleanup();
            if self.entries.len() >= self.max_entries {
                self.remove_oldest();
            }
        }

        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Get a cached value if still inside its TTL
    pub fn get(&self, key: &str) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_valid())
            .map(|entry| entry.value.clone())
    }

    pub fn get_entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key).filter(|entry| entry.is_valid())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_entry(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove expired entries
    pub fn cleanup(&mut self) {
        self.entries.retain(|_, entry| entry.is_valid());
    }

    fn remove_oldest(&mut self) {
        if let Some(oldest_key) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(key, _)| key.clone())
        {
            self.entries.remove(&oldest_key);
        }
    }

    /// Number of entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn valid_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_valid()).count()
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.entries.len();
        let valid = self.valid_count();
        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total - valid,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}

/// Process-wide cache handle shared between request handlers
#[derive(Debug)]
pub struct SharedCache<V> {
    inner: Arc<RwLock<TtlCache<V>>>,
}

impl<V> Clone for SharedCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> SharedCache<V> {
    pub fn new(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TtlCache::with_config(default_ttl, max_entries))),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        self.inner.read().await.get(key)
    }

    pub async fn set(&self, key: impl Into<String>, value: V) {
        self.inner.write().await.set(key, value);
    }

    pub async fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        self.inner.write().await.set_with_ttl(key, value, ttl);
    }

    pub async fn remove(&self, key: &str) -> Option<V> {
        self.inner.write().await.remove(key)
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    /// Return the cached value or compute, store and return it
    ///
    /// Errors are not cached. The lock is not held while `make` runs, so two
    /// concurrent misses may both compute.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        make: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key).await {
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }

        let value = make().await?;
        self.set_with_ttl(key, value.clone(), ttl).await;
        Ok(value)
    }
}

impl<V: Clone> Default for SharedCache<V> {
    fn default() -> Self {
        Self::new(TtlCache::<V>::DEFAULT_TTL, TtlCache::<V>::DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_within_ttl() {
        let mut cache = TtlCache::new();
        cache.set("price:solana", 142.5_f64);
        assert_eq!(cache.get("price:solana"), Some(142.5));
        assert_eq!(cache.get("price:missing"), None);
    }

    #[test]
    fn test_value_returned_unchanged() {
        let mut cache: TtlCache<serde_json::Value> = TtlCache::new();
        let value = serde_json::json!({ "usd": 1.0, "nested": [1, 2, 3] });
        cache.set("k", value.clone());
        assert_eq!(cache.get("k"), Some(value));
    }

    #[test]
    fn test_expiry() {
        let mut cache = TtlCache::with_config(Duration::from_millis(10), 100);
        cache.set("k", 1u32);
        assert!(cache.contains("k"));

        std::thread::sleep(Duration::from_millis(20));

        assert!(!cache.contains("k"));
        assert_eq!(cache.get("k"), None);
        // Expired entries linger until swept
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expired_entries, 1);
    }

    #[test]
    fn test_per_entry_ttl() {
        let mut cache = TtlCache::with_config(Duration::from_millis(10), 100);
        cache.set("short", 1u32);
        cache.set_with_ttl("long", 2u32, Duration::from_secs(60));

        std::thread::sleep(Duration::from_millis(20));

        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.get("long"), Some(2));
        assert_eq!(cache.get_entry("long").unwrap().ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_cleanup_sweeps_expired() {
        let mut cache = TtlCache::with_config(Duration::from_millis(10), 100);
        for i in 0..5 {
            cache.set(format!("k{}", i), i);
        }
        assert_eq!(cache.len(), 5);

        std::thread::sleep(Duration::from_millis(20));
        cache.cleanup();

        assert!(cache.is_empty());
    }

    #[test]
    fn test_max_entries() {
        let mut cache = TtlCache::with_config(Duration::from_secs(60), 3);
        for i in 0..5 {
            cache.set(format!("k{}", i), i);
        }
        assert!(cache.len() <= 3);
        // Newest entry always survives
        assert_eq!(cache.get("k4"), Some(4));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut cache = TtlCache::with_config(Duration::from_secs(60), 2);
        cache.set("a", 1);
        cache.set("b", 2);
        cache.set("a", 3);
        assert_eq!(cache.get("a"), Some(3));
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_entry_time_remaining() {
        let entry = CacheEntry::new(1u8, Duration::from_millis(50));
        assert!(entry.time_remaining().unwrap() <= Duration::from_millis(50));

        std::thread::sleep(Duration::from_millis(60));
        assert!(entry.time_remaining().is_none());
    }

    #[tokio::test]
    async fn test_shared_cache_get_or_insert() {
        let cache: SharedCache<String> = SharedCache::new(Duration::from_secs(60), 10);

        let first: Result<String, String> = cache
            .get_or_try_insert_with("k", Duration::from_secs(60), || async { Ok("v1".to_string()) })
            .await;
        assert_eq!(first.unwrap(), "v1");

        // Second call hits the cache, the closure result is ignored
        let second: Result<String, String> = cache
            .get_or_try_insert_with("k", Duration::from_secs(60), || async { Ok("v2".to_string()) })
            .await;
        assert_eq!(second.unwrap(), "v1");
    }

    #[tokio::test]
    async fn test_shared_cache_errors_not_cached() {
        let cache: SharedCache<u32> = SharedCache::default();

        let failed: Result<u32, &str> = cache
            .get_or_try_insert_with("k", Duration::from_secs(60), || async { Err("boom") })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.get("k").await, None);

        let clone = cache.clone();
        clone.set("k", 7).await;
        assert_eq!(cache.get("k").await, Some(7));
    }

    #[test]
    fn test_shared_cache_stats() {
        let cache: SharedCache<u32> = SharedCache::new(Duration::from_secs(60), 10);

        tokio_test::block_on(async {
            cache.set("a", 1).await;
            cache.set_with_ttl("b", 2, Duration::from_millis(10)).await;
        });
        std::thread::sleep(Duration::from_millis(20));

        let stats = tokio_test::block_on(cache.stats());
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(tokio_test::block_on(cache.remove("a")), Some(1));
    }
}
