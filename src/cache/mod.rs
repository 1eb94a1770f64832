// src/cache/mod.rs
mod lru;
mod ttl;


pub use lru::LruCache;
pub use ttl::TtlCache;

use crate::config::{CacheConfig, CacheKind};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Point-in-time view of an engine's counters.
///
/// `evictions` counts capacity evictions only; a TTL expiry is a miss, never
/// an eviction. The two outcomes stay separate on purpose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub evictions: u64,
}

/// The capability interface both eviction policies implement.
///
/// Implementations serialize concurrent access internally; callers share an
/// engine through `Arc<dyn CacheEngine>` with no outer locking.
pub trait CacheEngine: Send + Sync {
    /// Returns the cached value, or `None` on a miss (absent or expired).
    fn get(&self, key: &str) -> Option<Value>;

    /// Inserts or overwrites an entry.
    fn put(&self, key: &str, value: Value);

    /// Snapshot of {hits, misses, size, evictions}.
    fn snapshot(&self) -> CacheSnapshot;
}

/// Builds the engine the config asks for. The policy is fixed at startup and
/// not switchable at runtime.
pub fn build_cache(config: &CacheConfig) -> Arc<dyn CacheEngine> {
    match config.kind {
        CacheKind::Ttl => Arc::new(TtlCache::new(config.ttl())),
        CacheKind::Lru => Arc::new(LruCache::new(config.lru_capacity)),
    }
}
