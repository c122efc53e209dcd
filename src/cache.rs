//! In-process response cache with a fixed time-to-live per entry.
//!
//! Used for translation results, keyed by the normalized range string
//! (see [`range_key`](crate::extract::range_key)). Concurrent misses on the
//! same key may both populate the cache; the last write wins.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    inserted_at: Instant,
}

/// Key → value map whose entries expire `ttl` after insertion.
pub struct TtlCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached value if present and not expired.
    ///
    /// An expired entry is removed on access.
    pub fn get(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                    return Some(entry.value.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        // Re-check under the write lock; another writer may have refreshed it.
        if let Some(entry) = entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// Expired entries are swept on every insert, so keys that are never
    /// read again do not accumulate.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        entries.insert(
            key.into(),
            Entry {
                value: value.into(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("Genesis.1:1-1:1", "In die begin");
        assert_eq!(cache.get("Genesis.1:1-1:1").as_deref(), Some("In die begin"));
        assert_eq!(cache.get("Genesis.1:2-1:2"), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.insert("k", "v");
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("k", "first");
        cache.insert("k", "second");
        assert_eq!(cache.get("k").as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_sweeps_unread_expired_keys() {
        let cache = TtlCache::new(Duration::from_millis(20));
        for i in 0..1000 {
            cache.insert(format!("Psalms.{}:1-{}:1", i + 1, i + 1), "x");
        }
        std::thread::sleep(Duration::from_millis(60));

        cache.insert("John.3:16-3:16", "fresh");
        assert_eq!(cache.get("John.3:16-3:16").as_deref(), Some("fresh"));
        assert_eq!(cache.len(), 1);
    }
}
