// src/health/prober.rs
// Out-of-band health probing. Every interval the prober sends a METRICS
// request to every configured proxy regardless of current status; this is
// the only path by which an unhealthy proxy is discovered as recovered. The
// probe result doubles as the least-loaded strategy's load-metric refresh.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info};

use crate::wire;

use super::HealthTracker;

pub struct Prober {
    tracker: Arc<HealthTracker>,
    probe_interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Prober {
    pub fn new(tracker: Arc<HealthTracker>, probe_interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            tracker,
            probe_interval,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Runs for the life of the process (or until `shutdown`).
    pub async fn start(self: Arc<Self>) {
        let mut ticker = interval(self.probe_interval);
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!("starting prober with interval {:?}", self.probe_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.probe_all().await;
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("prober shutting down");
                        break;
                    }
                }
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// One probe sweep over every configured proxy, healthy or not.
    pub async fn probe_all(&self) {
        let probes = self
            .tracker
            .proxies()
            .iter()
            .map(|addr| {
                let addr = addr.clone();
                async move {
                    let result = wire::request_metrics(&addr).await;
                    (addr, result)
                }
            })
            .collect::<Vec<_>>();

        for (addr, result) in futures::future::join_all(probes).await {
            match result {
                Ok(report) => {
                    self.tracker.set_load(&addr, report.requests);
                    self.tracker.record_success(&addr);
                    debug!(proxy = %addr, load = report.requests, "probe ok");
                }
                Err(err) => {
                    self.tracker.record_failure(&addr);
                    debug!(proxy = %addr, %err, "probe failed");
                }
            }
        }
    }
}
