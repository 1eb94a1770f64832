// src/proxy/node.rs
// The proxy service: serves reads from its cache engine, fetches from the
// origin on a miss, and reports a metrics snapshot on demand.

use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::cache::CacheEngine;
use crate::error::Error;
use crate::wire::{self, GetResponse, ProxyMetricsReport, Request, Status};

use super::{Fetched, OriginClient, ProxyMetrics};

pub struct ProxyNode {
    /// Port this node answers on; echoed back in every GET response.
    port: u16,
    cache: Arc<dyn CacheEngine>,
    origin: OriginClient,
    metrics: ProxyMetrics,
}

impl ProxyNode {
    pub fn new(port: u16, cache: Arc<dyn CacheEngine>, origin: OriginClient) -> Self {
        Self {
            port,
            cache,
            origin,
            metrics: ProxyMetrics::new(),
        }
    }

    /// Accept loop: each inbound connection is handled independently and
    /// concurrently; the cache engine's internal lock is the only shared
    /// synchronization point.
    pub async fn run(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        info!("proxy node {} listening on {}", self.port, listener.local_addr()?);
        loop {
            let (stream, peer) = listener.accept().await?;
            let node = self.clone();
            tokio::spawn(async move {
                if let Err(err) = node.handle_connection(stream).await {
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

        let body = match Request::parse(&line) {
            Ok(Request::Metrics) => serde_json::to_string(&self.metrics_report()),
            Ok(Request::Get { resource, key }) => {
                let cache_key = format!("{resource}/{key}");
                serde_json::to_string(&self.handle_get(&cache_key).await)
            }
            Err(err) => {
                let status = match err {
                    Error::WrongMethod(_) => Status::WrongMethod,
                    _ => Status::BadRequest,
                };
                serde_json::to_string(&GetResponse {
                    status,
                    data: Some(err.to_string().into()),
                    cache_hit: false,
                    node: self.port,
                })
            }
        };

        let body = body.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        wire::write_line(&mut stream, &body).await
    }

    /// Read-through path: cache hit short-circuits; a miss consults the
    /// origin and populates the cache only on an OK answer. Negative results
    /// are never cached.
    pub async fn handle_get(&self, cache_key: &str) -> GetResponse {
        self.metrics.record_request();

        if let Some(value) = self.cache.get(cache_key) {
            debug!(key = cache_key, "cache hit");
            return self.respond(Status::Ok, Some(value), true);
        }

        self.metrics.record_origin_fetch();
        match self.origin.fetch(cache_key).await {
            Ok(Fetched::Ok(value)) => {
                self.cache.put(cache_key, value.clone());
                debug!(key = cache_key, "populated from origin");
                self.respond(Status::Ok, Some(value), false)
            }
            Ok(Fetched::NotFound) => self.respond(Status::NotFound, None, false),
            Err(err) => {
                warn!(key = cache_key, %err, "origin fetch failed");
                self.respond(Status::OriginFailure, None, false)
            }
        }
    }

    /// Engine counters merged with the node's own request counters.
    pub fn metrics_report(&self) -> ProxyMetricsReport {
        let snap = self.cache.snapshot();
        let lookups = snap.hits + snap.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            snap.hits as f64 / lookups as f64
        };

        ProxyMetricsReport {
            hits: snap.hits,
            misses: snap.misses,
            requests: self.metrics.total_requests(),
            origin_fetches: self.metrics.origin_fetches(),
            hit_rate,
            size: snap.size,
        }
    }

    fn respond(&self, status: Status, data: Option<serde_json::Value>, cache_hit: bool) -> GetResponse {
        GetResponse {
            status,
            data,
            cache_hit,
            node: self.port,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    /// In-process origin stand-in. Answers NOT_FOUND for every key while
    /// `found` is false, OK with a fixed payload once it flips.
    async fn spawn_fake_origin(found: Arc<AtomicBool>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                let found = found.clone();
                tokio::spawn(async move {
                    let mut reader = BufReader::new(stream);
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.is_err() {
                        return;
                    }
                    let body = if found.load(Ordering::SeqCst) {
                        r#"{"status":"OK","data":"fresh"}"#
                    } else {
                        r#"{"status":"NOT_FOUND","data":null}"#
                    };
                    let mut stream = reader.into_inner();
                    let _ = stream.write_all(body.as_bytes()).await;
                    let _ = stream.write_all(b"\n").await;
                });
            }
        });
        addr
    }

    fn node(origin_addr: &str) -> ProxyNode {
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60)));
        ProxyNode::new(9100, cache, OriginClient::new(origin_addr))
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let found = Arc::new(AtomicBool::new(true));
        let origin = spawn_fake_origin(found).await;
        let node = node(&origin);

        let first = node.handle_get("users/1").await;
        assert_eq!(first.status, Status::Ok);
        assert!(!first.cache_hit);
        assert_eq!(first.node, 9100);

        let second = node.handle_get("users/1").await;
        assert_eq!(second.status, Status::Ok);
        assert!(second.cache_hit);
        assert_eq!(second.data, Some(json!("fresh")));

        let report = node.metrics_report();
        assert_eq!(report.requests, 2);
        assert_eq!(report.origin_fetches, 1);
        assert_eq!(report.hits, 1);
        assert_eq!(report.misses, 1);
    }

    #[tokio::test]
    async fn negative_results_are_never_cached() {
        let found = Arc::new(AtomicBool::new(false));
        let origin = spawn_fake_origin(found.clone()).await;
        let node = node(&origin);

        let miss = node.handle_get("users/404").await;
        assert_eq!(miss.status, Status::NotFound);
        assert!(!miss.cache_hit);

        // The origin learns about the key; the proxy must surface the
        // corrected answer instead of a stale NOT_FOUND.
        found.store(true, Ordering::SeqCst);
        let corrected = node.handle_get("users/404").await;
        assert_eq!(corrected.status, Status::Ok);
        assert!(!corrected.cache_hit);
        assert_eq!(corrected.data, Some(json!("fresh")));
    }

    #[tokio::test]
    async fn origin_down_is_origin_failure() {
        // Nothing listens on this address.
        let node = node("127.0.0.1:1");
        let response = node.handle_get("users/1").await;
        assert_eq!(response.status, Status::OriginFailure);
        assert!(response.data.is_none());

        let report = node.metrics_report();
        assert_eq!(report.requests, 1);
        assert_eq!(report.origin_fetches, 1);
    }
}
