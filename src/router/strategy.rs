// src/router/strategy.rs
use async_trait::async_trait;

use crate::health::HealthTracker;

/// A routing strategy picks a target among the currently healthy proxies.
///
/// `select` never performs I/O; load metrics are whatever the prober last
/// recorded in the tracker. `None` means no healthy proxy exists, a
/// terminal condition for the single request; it is never retried here.
#[async_trait]
pub trait RoutingStrategy: Send + Sync {
    async fn select(&self, tracker: &HealthTracker) -> Option<String>;

    fn name(&self) -> &'static str;
}
