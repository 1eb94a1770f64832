// src/cache/lru.rs
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{CacheEngine, CacheSnapshot};

#[derive(Default)]
struct LruInner {
    entries: HashMap<String, Value>,
    /// Recency order: front = most recently used, back = least recently used.
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl LruInner {
    fn touch(&mut self, key: &str) {
        self.order.retain(|k| k != key);
        self.order.push_front(key.to_string());
    }
}

/// Cache bounded to a fixed entry count, evicting the least-recently-used
/// entry on overflow. A hit refreshes recency; ties fall to the entry
/// untouched longest.
pub struct LruCache {
    capacity: usize,
    inner: Mutex<LruInner>,
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LRU capacity must be at least 1");
        Self {
            capacity,
            inner: Mutex::new(LruInner::default()),
        }
    }
}

impl CacheEngine for LruCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.lock().unwrap();
        match inner.entries.get(key) {
            Some(value) => {
                let value = value.clone();
                inner.hits += 1;
                inner.touch(key);
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    fn put(&self, key: &str, value: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.insert(key.to_string(), value);
        inner.touch(key);

        if inner.entries.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_back() {
                inner.entries.remove(&oldest);
                inner.evictions += 1;
                tracing::debug!(key = %oldest, "lru eviction");
            }
        }
    }

    fn snapshot(&self) -> CacheSnapshot {
        let inner = self.inner.lock().unwrap();
        CacheSnapshot {
            hits: inner.hits,
            misses: inner.misses,
            size: inner.entries.len(),
            evictions: inner.evictions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn size_never_exceeds_capacity() {
        let c = LruCache::new(2);
        c.put("k1", json!(1));
        c.put("k2", json!(2));
        c.put("k3", json!(3));
        assert_eq!(c.snapshot().size, 2);
        assert_eq!(c.snapshot().evictions, 1);
    }

    #[test]
    fn evicts_least_recently_used() {
        let c = LruCache::new(3);
        c.put("a", json!(1));
        c.put("b", json!(2));
        c.put("c", json!(3));

        // Touching `a` protects it from the next eviction.
        assert!(c.get("a").is_some());
        c.put("d", json!(4));

        assert!(c.get("a").is_some());
        assert!(c.get("b").is_none());
        assert!(c.get("c").is_some());
        assert!(c.get("d").is_some());
        assert_eq!(c.snapshot().evictions, 1);
    }

    #[test]
    fn eviction_tie_breaks_by_insertion_order() {
        let c = LruCache::new(2);
        c.put("first", json!(1));
        c.put("second", json!(2));
        c.put("third", json!(3));

        // Neither entry was read; the one inserted first goes.
        assert!(c.get("first").is_none());
        assert!(c.get("second").is_some());
    }

    #[test]
    fn overwrite_does_not_evict() {
        let c = LruCache::new(2);
        c.put("k1", json!(1));
        c.put("k2", json!(2));
        c.put("k1", json!(10));

        let snap = c.snapshot();
        assert_eq!(snap.size, 2);
        assert_eq!(snap.evictions, 0);
        assert_eq!(c.get("k1"), Some(json!(10)));
    }

    #[test]
    fn overwrite_refreshes_recency() {
        let c = LruCache::new(2);
        c.put("k1", json!(1));
        c.put("k2", json!(2));
        c.put("k1", json!(10));
        c.put("k3", json!(3));

        // k2 was the least recently touched.
        assert!(c.get("k2").is_none());
        assert!(c.get("k1").is_some());
        assert!(c.get("k3").is_some());
    }

    #[test]
    fn miss_counts() {
        let c = LruCache::new(2);
        assert!(c.get("absent").is_none());
        c.put("k1", json!(1));
        assert!(c.get("k1").is_some());

        let snap = c.snapshot();
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.misses, 1);
    }
}
