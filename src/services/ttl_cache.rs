use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Thread-safe map whose entries expire a fixed time after insertion.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Eq + Hash,
{
    entries: Arc<DashMap<K, Entry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Returns the cached value if it is still fresh. Stale entries are
    /// removed on read, unless a fresh one replaced them meanwhile.
    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
        }
        let ttl = self.ttl;
        self.entries.remove_if(key, |_, entry| entry.inserted_at.elapsed() >= ttl);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_fresh_entries() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("rates", 34.5);
        assert_eq!(cache.get(&"rates"), Some(34.5));
        assert_eq!(cache.get(&"missing"), None);
    }

    #[test]
    fn expires_entries_after_ttl() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.insert("rates", 1);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get(&"rates"), None);
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.insert("a", 1);
        cache.invalidate(&"a");
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn stale_read_keeps_a_fresh_replacement() {
        let cache = TtlCache::new(Duration::from_millis(20));
        cache.insert("rates", 1);
        std::thread::sleep(Duration::from_millis(40));
        cache.insert("rates", 2);
        assert_eq!(cache.get(&"rates"), Some(2));
    }
}
