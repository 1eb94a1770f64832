// src/health/mod.rs
mod prober;
mod tracker;

pub use prober::Prober;
pub use tracker::{HealthStatus, HealthTracker, RecordView};
