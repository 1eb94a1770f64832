// src/balancer/mod.rs
// Load balancer service: ties the router and health tracker together, runs
// the background prober, and serves client GET and METRICS requests.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::config::BalancerConfig;
use crate::error::{Error, Result};
use crate::health::{HealthTracker, Prober};
use crate::router::{self, RoutingStrategy};
use crate::wire::{self, BalancerMetrics, ProxySlot};

pub struct Balancer {
    tracker: Arc<HealthTracker>,
    strategy: Arc<dyn RoutingStrategy>,
    prober: Arc<Prober>,
}

impl Balancer {
    pub fn new(config: &BalancerConfig) -> Self {
        let tracker = Arc::new(HealthTracker::new(
            &config.proxies,
            config.failure_threshold,
        ));
        let prober = Arc::new(Prober::new(tracker.clone(), config.probe_interval()));
        Self {
            tracker,
            strategy: router::build_strategy(config.strategy),
            prober,
        }
    }

    pub fn tracker(&self) -> &Arc<HealthTracker> {
        &self.tracker
    }

    /// Spawns the probe loop; runs for the life of the process.
    pub fn start_prober(&self) {
        let prober = self.prober.clone();
        tokio::spawn(async move {
            prober.start().await;
        });
    }

    pub fn shutdown_prober(&self) {
        self.prober.shutdown();
    }

    pub async fn run(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        info!(
            strategy = self.strategy.name(),
            proxies = self.tracker.proxies().len(),
            "load balancer listening on {}",
            listener.local_addr()?
        );
        loop {
            let (stream, peer) = listener.accept().await?;
            let balancer = self.clone();
            tokio::spawn(async move {
                if let Err(err) = balancer.handle_connection(stream).await {
                    warn!(%peer, %err, "connection error");
                }
            });
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> std::io::Result<()> {
        let line = match wire::read_request_line(&mut stream).await? {
            Some(line) => line,
            None => return Ok(()),
        };

        let body = if line.trim() == "METRICS" {
            serde_json::to_string(&self.handle_metrics().await)
                .unwrap_or_else(|_| wire::unavailable_line())
        } else {
            self.handle_get(line.trim()).await
        };

        wire::write_line(&mut stream, &body).await
    }

    /// Routes a client GET. Every routing failure collapses to the same
    /// UNAVAILABLE reply for the client; the distinction only matters for
    /// health accounting and logs.
    pub async fn handle_get(&self, raw_line: &str) -> String {
        match self.route(raw_line).await {
            Ok(reply) => reply,
            Err(err) => {
                debug!(%err, "request failed");
                wire::unavailable_line()
            }
        }
    }

    /// Pick a healthy proxy, forward, and on transport failure or a
    /// malformed reply record the failure and retry the selection once
    /// against the remaining healthy set. The proxy's reply is relayed
    /// verbatim.
    async fn route(&self, raw_line: &str) -> Result<String> {
        let first = self
            .strategy
            .select(&self.tracker)
            .await
            .ok_or(Error::NoHealthyProxy)?;

        match self.forward(&first, raw_line).await {
            Ok(reply) => {
                self.tracker.record_success(&first);
                return Ok(reply);
            }
            Err(err) => {
                warn!(proxy = %first, %err, "forward failed, retrying once");
                self.tracker.record_failure(&first);
            }
        }

        let second = self
            .strategy
            .select(&self.tracker)
            .await
            .ok_or(Error::NoHealthyProxy)?;

        match self.forward(&second, raw_line).await {
            Ok(reply) => {
                self.tracker.record_success(&second);
                Ok(reply)
            }
            Err(err) => {
                warn!(proxy = %second, %err, "retry failed");
                self.tracker.record_failure(&second);
                Err(err)
            }
        }
    }

    /// Forwards one request line over a fresh connection. A reply that is
    /// not valid JSON counts the same as a transport failure.
    async fn forward(&self, proxy: &str, raw_line: &str) -> Result<String> {
        let reply = wire::send_line(proxy, raw_line).await?;
        serde_json::from_str::<serde_json::Value>(&reply)
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;
        Ok(reply)
    }

    /// Best-effort aggregation: every proxy is asked for its metrics in
    /// parallel; unreachable proxies are reported as such, not retried.
    pub async fn handle_metrics(&self) -> BalancerMetrics {
        let requests = self
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

        let mut proxies = BTreeMap::new();
        for (addr, result) in futures::future::join_all(requests).await {
            let slot = match result {
                Ok(report) => ProxySlot::Report(report),
                Err(_) => ProxySlot::Unreachable("unreachable".to_string()),
            };
            proxies.insert(addr, slot);
        }

        BalancerMetrics {
            proxies,
            healthy_count: self.tracker.healthy_count(),
            strategy: self.strategy.name().to_string(),
        }
    }
}
