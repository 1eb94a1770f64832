// src/router/round_robin.rs
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::health::HealthTracker;

use super::RoutingStrategy;

/// Rotates over the full configured proxy list, skipping entries currently
/// marked unhealthy and wrapping at most once before giving up.
///
/// The cursor indexes the configured list, not the filtered healthy set, so
/// fairness among healthy proxies holds even as membership of the healthy
/// set changes. `fetch_add` hands every concurrent caller a distinct slot.
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            cursor: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoutingStrategy for RoundRobin {
    async fn select(&self, tracker: &HealthTracker) -> Option<String> {
        let proxies = tracker.proxies();
        if proxies.is_empty() {
            return None;
        }

        for _ in 0..proxies.len() {
            let index = self.cursor.fetch_add(1, Ordering::Relaxed) % proxies.len();
            let candidate = &proxies[index];
            if tracker.is_healthy(candidate) {
                return Some(candidate.clone());
            }
        }
        None
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
