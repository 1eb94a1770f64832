// src/router/least_loaded.rs
use async_trait::async_trait;

use crate::health::HealthTracker;

use super::RoutingStrategy;

/// Picks the healthy proxy with the lowest last-probed load metric. Ties
/// break toward the proxy earliest in configuration order, so selection is
/// deterministic. Never blocks on a network call: the prober refreshes the
/// metric out of band, and an unprobed proxy counts as load zero.
pub struct LeastLoaded;

#[async_trait]
impl RoutingStrategy for LeastLoaded {
    async fn select(&self, tracker: &HealthTracker) -> Option<String> {
        tracker
            .proxies()
            .iter()
            .filter(|id| tracker.is_healthy(id))
            .min_by_key(|id| tracker.load(id))
            .cloned()
    }

    fn name(&self) -> &'static str {
        "least_loaded"
    }
}
