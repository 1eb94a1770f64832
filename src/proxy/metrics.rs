// src/proxy/metrics.rs
use std::sync::atomic::{AtomicU64, Ordering};

/// Request counters owned by the proxy service itself; cache hit/miss
/// counters live inside the engine and are merged at report time.
#[derive(Debug, Default)]
pub struct ProxyMetrics {
    total_requests: AtomicU64,
    origin_fetches: AtomicU64,
}

impl ProxyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every GET counts, regardless of hit/miss outcome.
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Counted only when a miss reaches out to the origin.
    pub fn record_origin_fetch(&self) {
        self.origin_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn origin_fetches(&self) -> u64 {
        self.origin_fetches.load(Ordering::Relaxed)
    }
}
