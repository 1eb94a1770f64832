// src/router/mod.rs
mod least_loaded;
mod round_robin;
mod strategy;

pub use least_loaded::LeastLoaded;
pub use round_robin::RoundRobin;
pub use strategy::RoutingStrategy;

use crate::config::Strategy;
use std::sync::Arc;

/// Builds the configured strategy. Chosen at startup, not switchable at
/// runtime.
pub fn build_strategy(strategy: Strategy) -> Arc<dyn RoutingStrategy> {
    match strategy {
        Strategy::RoundRobin => Arc::new(RoundRobin::new()),
        Strategy::LeastLoaded => Arc::new(LeastLoaded),
    }
}
