//! Time-bounded read-through cache
//!
//! Runs on the tokio clock so paused-time tests can step past the TTL.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// Map whose entries expire `ttl` after they were stored
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Time-to-live
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) > self.ttl
    }

    /// Unexpired value for `key`
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.value.clone())
    }

    /// Store `value`, replacing any previous entry
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop one entry
    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop every entry whose key matches
    pub fn invalidate_where(&mut self, mut predicate: impl FnMut(&K) -> bool) {
        self.entries.retain(|key, _| !predicate(key));
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries and return how many were dropped
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) <= ttl);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_ttl() {
        let mut cache = TtlCache::new(Duration::from_secs(30));
        cache.insert("balance", 5u64);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.get(&"balance"), Some(5));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get(&"balance"), None);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_refreshes_timestamp() {
        let mut cache = TtlCache::new(Duration::from_secs(10));
        cache.insert(1, "a");
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.insert(1, "b");
        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&1), Some("b"));
    }

    #[test]
    fn test_invalidation() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("balance:a".to_string(), 1);
        cache.insert("balance:b".to_string(), 2);
        cache.insert("count".to_string(), 3);

        cache.invalidate(&"count".to_string());
        assert_eq!(cache.get(&"count".to_string()), None);

        cache.invalidate_where(|key| key.starts_with("balance:"));
        assert!(cache.is_empty());

        cache.insert("count".to_string(), 4);
        cache.clear();
        assert!(cache.is_empty());
    }
}
