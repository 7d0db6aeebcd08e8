//! In-memory response cache.
//!
//! LRU with a per-entry TTL. Entries are keyed by topic plus language so
//! the same topic analyzed in two languages occupies two slots. Expired
//! entries are dropped on read.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CacheConfig;
use crate::types::InsightResponse;

pub struct InsightCache {
    entries: Mutex<LruCache<String, (Instant, InsightResponse)>>,
    ttl: Duration,
}

impl InsightCache {
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl: Duration::from_secs(config.ttl_secs),
        }
    }

    /// Fetch a cached record if it exists and has not expired.
    pub fn get(&self, key: &str) -> Option<InsightResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some((inserted, response)) if inserted.elapsed() < self.ttl => {
                debug!(key, "cache hit");
                Some(response.clone())
            }
            Some(_) => {
                debug!(key, "cache entry expired");
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: String, response: InsightResponse) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(key, (Instant::now(), response));
    }

    /// Drop every cached record.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;

    fn sample(topic: &str) -> InsightResponse {
        normalize(topic, None)
    }

    fn cache(capacity: usize, ttl_secs: u64) -> InsightCache {
        InsightCache::new(&CacheConfig {
            capacity,
            ttl_secs,
        })
    }

    #[test]
    fn test_put_then_get() {
        let cache = cache(8, 60);
        cache.put("Rust_en".into(), sample("Rust"));
        let hit = cache.get("Rust_en").unwrap();
        assert_eq!(hit.topic, "Rust");
        assert!(cache.get("Rust_ru").is_none());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = cache(8, 0);
        cache.put("k".into(), sample("Rust"));
        assert!(cache.get("k").is_none());
        // Expired entry was evicted on read.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let cache = cache(2, 60);
        cache.put("a_".into(), sample("a1"));
        cache.put("b_".into(), sample("b1"));
        cache.put("c_".into(), sample("c1"));
        assert!(cache.get("a_").is_none());
        assert!(cache.get("b_").is_some());
        assert!(cache.get("c_").is_some());
    }

    #[test]
    fn test_clear() {
        let cache = cache(8, 60);
        cache.put("k".into(), sample("Rust"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_config_still_holds_one() {
        let cache = cache(0, 60);
        cache.put("k".into(), sample("Rust"));
        assert!(cache.get("k").is_some());
    }
}
