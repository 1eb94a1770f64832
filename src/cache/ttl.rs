// src/cache/ttl.rs
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{CacheEngine, CacheSnapshot};

struct TtlEntry {
    value: Value,
    expires_at: Instant,
}

#[derive(Default)]
struct TtlInner {
    entries: HashMap<String, TtlEntry>,
    hits: u64,
    misses: u64,
}

/// Cache with a uniform time-to-live applied to every entry.
///
/// Expired entries are removed lazily on read and counted as misses, not
/// evictions. There is no capacity bound; unbounded growth is a known
/// limitation of this policy.
pub struct TtlCache {
    ttl: Duration,
    inner: Mutex<TtlInner>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(TtlInner::default()),
        }
    }
}

impl CacheEngine for TtlCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.lock().unwrap();
        match inner.entries.get(key) {
            Some(entry) if Instant::now() >= entry.expires_at => {
                inner.entries.remove(key);
                inner.misses += 1;
                tracing::debug!(key, "ttl entry expired");
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                inner.hits += 1;
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
        inner.entries.insert(
            key.to_string(),
            TtlEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    fn snapshot(&self) -> CacheSnapshot {
        let inner = self.inner.lock().unwrap();
        CacheSnapshot {
            hits: inner.hits,
            misses: inner.misses,
            size: inner.entries.len(),
            evictions: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    fn cache(secs: u64) -> TtlCache {
        TtlCache::new(Duration::from_secs(secs))
    }

    #[test]
    fn get_basic() {
        let c = cache(30);
        c.put("users/1", json!("alice"));
        assert_eq!(c.get("users/1"), Some(json!("alice")));
        assert_eq!(c.snapshot().size, 1);
    }

    #[test]
    fn get_absent_is_miss() {
        let c = cache(30);
        assert_eq!(c.get("users/1"), None);
        let snap = c.snapshot();
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.hits, 0);
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let c = cache(30);
        c.put("users/1", json!("alice"));
        c.put("users/1", json!("bob"));
        assert_eq!(c.get("users/1"), Some(json!("bob")));
        assert_eq!(c.snapshot().size, 1);
    }

    #[test]
    fn expired_read_is_miss_not_eviction() {
        let c = cache(1);
        c.put("users/1", json!("alice"));
        sleep(Duration::from_millis(1100));

        assert_eq!(c.get("users/1"), None);
        let snap = c.snapshot();
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.evictions, 0);
        // lazy removal happened
        assert_eq!(snap.size, 0);
    }

    #[test]
    fn put_refreshes_expiry() {
        let c = cache(1);
        c.put("users/1", json!("alice"));
        sleep(Duration::from_millis(600));
        c.put("users/1", json!("alice"));
        sleep(Duration::from_millis(600));
        // re-put reset the clock, so the entry is still live
        assert_eq!(c.get("users/1"), Some(json!("alice")));
    }
}
