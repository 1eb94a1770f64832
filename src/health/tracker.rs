// src/health/tracker.rs
// Per-proxy health state, independent of routing strategy. Demotion is
// conservative (a threshold of consecutive failures), recovery is optimistic
// (a single success flips back and resets the counter).

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug)]
struct ProxyRecord {
    status: HealthStatus,
    consecutive_failures: u32,
    /// Last load metric seen by the prober (the proxy's total request count).
    load: u64,
    last_success: Option<DateTime<Utc>>,
}

impl ProxyRecord {
    fn new() -> Self {
        Self {
            status: HealthStatus::Healthy,
            consecutive_failures: 0,
            load: 0,
            last_success: None,
        }
    }
}

/// Read-only view of a record, for metrics and logging.
#[derive(Debug, Clone, Copy)]
pub struct RecordView {
    pub status: HealthStatus,
    pub consecutive_failures: u32,
    pub load: u64,
    pub last_success: Option<DateTime<Utc>>,
}

/// Tracks health for the statically configured proxy set.
///
/// Records live in a `DashMap`; each mutation holds the entry's shard lock,
/// so `record_success`/`record_failure`/`is_healthy` are mutually atomic for
/// the same proxy. `order` preserves configuration order for deterministic
/// iteration and tie-breaking.
pub struct HealthTracker {
    records: DashMap<String, ProxyRecord>,
    order: Vec<String>,
    failure_threshold: u32,
}

impl HealthTracker {
    pub fn new(proxies: &[String], failure_threshold: u32) -> Self {
        let records = DashMap::new();
        for addr in proxies {
            records.insert(addr.clone(), ProxyRecord::new());
        }
        Self {
            records,
            order: proxies.to_vec(),
            failure_threshold,
        }
    }

    /// Configured proxy ids, in configuration order.
    pub fn proxies(&self) -> &[String] {
        &self.order
    }

    pub fn record_success(&self, id: &str) {
        if let Some(mut record) = self.records.get_mut(id) {
            if record.status == HealthStatus::Unhealthy {
                info!(proxy = id, "proxy recovered");
            }
            record.status = HealthStatus::Healthy;
            record.consecutive_failures = 0;
            record.last_success = Some(Utc::now());
        }
    }

    pub fn record_failure(&self, id: &str) {
        if let Some(mut record) = self.records.get_mut(id) {
            record.consecutive_failures += 1;
            if record.consecutive_failures >= self.failure_threshold
                && record.status == HealthStatus::Healthy
            {
                record.status = HealthStatus::Unhealthy;
                warn!(
                    proxy = id,
                    failures = record.consecutive_failures,
                    "proxy marked unhealthy"
                );
            }
        }
    }

    pub fn is_healthy(&self, id: &str) -> bool {
        self.records
            .get(id)
            .map(|r| r.status == HealthStatus::Healthy)
            .unwrap_or(false)
    }

    pub fn set_load(&self, id: &str, load: u64) {
        if let Some(mut record) = self.records.get_mut(id) {
            record.load = load;
        }
    }

    pub fn load(&self, id: &str) -> u64 {
        self.records.get(id).map(|r| r.load).unwrap_or(0)
    }

    pub fn healthy_count(&self) -> usize {
        self.order.iter().filter(|id| self.is_healthy(id)).count()
    }

    pub fn list_healthy(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| self.is_healthy(id))
            .cloned()
            .collect()
    }

    pub fn view(&self, id: &str) -> Option<RecordView> {
        self.records.get(id).map(|r| RecordView {
            status: r.status,
            consecutive_failures: r.consecutive_failures,
            load: r.load,
            last_success: r.last_success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> HealthTracker {
        HealthTracker::new(
            &["127.0.0.1:9001".to_string(), "127.0.0.1:9002".to_string()],
            3,
        )
    }

    #[test]
    fn starts_healthy() {
        let t = tracker();
        assert!(t.is_healthy("127.0.0.1:9001"));
        assert_eq!(t.healthy_count(), 2);
    }

    #[test]
    fn demoted_at_exactly_threshold() {
        let t = tracker();
        t.record_failure("127.0.0.1:9001");
        t.record_failure("127.0.0.1:9001");
        assert!(t.is_healthy("127.0.0.1:9001"));

        t.record_failure("127.0.0.1:9001");
        assert!(!t.is_healthy("127.0.0.1:9001"));
        assert_eq!(t.healthy_count(), 1);
        assert_eq!(t.list_healthy(), vec!["127.0.0.1:9002".to_string()]);
    }

    #[test]
    fn single_success_recovers_and_resets() {
        let t = tracker();
        for _ in 0..3 {
            t.record_failure("127.0.0.1:9001");
        }
        assert!(!t.is_healthy("127.0.0.1:9001"));

        t.record_success("127.0.0.1:9001");
        assert!(t.is_healthy("127.0.0.1:9001"));
        assert_eq!(t.view("127.0.0.1:9001").unwrap().consecutive_failures, 0);

        // The counter was reset: it takes a full threshold again.
        t.record_failure("127.0.0.1:9001");
        t.record_failure("127.0.0.1:9001");
        assert!(t.is_healthy("127.0.0.1:9001"));
    }

    #[test]
    fn success_interleaved_resets_counter() {
        let t = tracker();
        t.record_failure("127.0.0.1:9001");
        t.record_failure("127.0.0.1:9001");
        t.record_success("127.0.0.1:9001");
        t.record_failure("127.0.0.1:9001");
        t.record_failure("127.0.0.1:9001");
        // Never three in a row.
        assert!(t.is_healthy("127.0.0.1:9001"));
    }

    #[test]
    fn unknown_proxy_is_not_healthy() {
        let t = tracker();
        assert!(!t.is_healthy("127.0.0.1:9999"));
        // Mutations on unknown ids are ignored, not panics.
        t.record_failure("127.0.0.1:9999");
        t.record_success("127.0.0.1:9999");
    }

    #[test]
    fn load_defaults_to_zero() {
        let t = tracker();
        assert_eq!(t.load("127.0.0.1:9001"), 0);
        t.set_load("127.0.0.1:9001", 42);
        assert_eq!(t.load("127.0.0.1:9001"), 42);
    }

    #[test]
    fn success_stamps_last_probe_time() {
        let t = tracker();
        assert!(t.view("127.0.0.1:9001").unwrap().last_success.is_none());
        t.record_success("127.0.0.1:9001");
        assert!(t.view("127.0.0.1:9001").unwrap().last_success.is_some());
    }
}
