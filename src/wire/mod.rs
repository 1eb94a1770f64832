// src/wire/mod.rs
// Line-delimited protocol shared by every component: one UTF-8 request line
// over a fresh connection, one newline-terminated JSON object back, then the
// connection closes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// A parsed inbound request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `GET <resource>/<key>`
    Get { resource: String, key: String },
    /// `METRICS`
    Metrics,
}

impl Request {
    /// Parses a raw request line. `GET users/1` and `METRICS` are the only
    /// recognized forms; anything else maps to `WrongMethod` or `BadRequest`.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line == "METRICS" {
            return Ok(Request::Metrics);
        }

        let (method, url) = line
            .split_once(' ')
            .ok_or_else(|| Error::BadRequest(format!("cannot parse request: {line:?}")))?;

        if method != "GET" {
            return Err(Error::WrongMethod(method.to_string()));
        }

        let url = url.trim();
        let (resource, key) = url
            .split_once('/')
            .ok_or_else(|| Error::BadRequest(format!("expected <resource>/<key>, got {url:?}")))?;

        if resource.is_empty() || key.is_empty() {
            return Err(Error::BadRequest(format!(
                "expected <resource>/<key>, got {url:?}"
            )));
        }

        Ok(Request::Get {
            resource: resource.to_string(),
            key: key.to_string(),
        })
    }
}

/// Response statuses used across the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ok,
    NotFound,
    OriginFailure,
    WrongMethod,
    BadRequest,
    Unavailable,
}

/// Origin reply: `{"status": "OK"|"NOT_FOUND", "data": <value>|null}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginResponse {
    pub status: Status,
    pub data: Option<Value>,
}

/// Proxy GET reply; `node` is the serving proxy's port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    pub status: Status,
    pub data: Option<Value>,
    pub cache_hit: bool,
    pub node: u16,
}

/// Proxy METRICS reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyMetricsReport {
    pub hits: u64,
    pub misses: u64,
    pub requests: u64,
    pub origin_fetches: u64,
    pub hit_rate: f64,
    pub size: usize,
}

/// Per-proxy slot in the balancer METRICS reply: either the proxy's own
/// report or the literal string `"unreachable"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProxySlot {
    Report(ProxyMetricsReport),
    Unreachable(String),
}

/// Balancer METRICS reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancerMetrics {
    pub proxies: BTreeMap<String, ProxySlot>,
    pub healthy_count: usize,
    pub strategy: String,
}

/// The balancer's terminal failure reply for a client GET.
pub fn unavailable_line() -> String {
    serde_json::json!({ "status": Status::Unavailable }).to_string()
}

/// One-shot exchange: connect to `addr`, send a single request line, read a
/// single reply line. Every hop in the cluster (proxy to origin, balancer to
/// proxy, prober, client) speaks through this.
pub async fn send_line(addr: &str, line: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await?;

    let mut reader = BufReader::new(stream);
    let mut reply = String::new();
    let n = reader.read_line(&mut reply).await?;
    if n == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before reply",
        ));
    }
    Ok(reply.trim_end().to_string())
}

/// Writes one newline-terminated reply line back to a client.
pub async fn write_line(stream: &mut TcpStream, line: &str) -> std::io::Result<()> {
    stream.write_all(line.as_bytes()).await?;
    stream.write_all(b"\n").await
}

/// Reads the single request line off an inbound connection.
pub async fn read_request_line(stream: &mut TcpStream) -> std::io::Result<Option<String>> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Fetches and parses a proxy's METRICS report.
pub async fn request_metrics(addr: &str) -> Result<ProxyMetricsReport> {
    let reply = send_line(addr, "METRICS").await?;
    serde_json::from_str(&reply).map_err(|e| Error::MalformedResponse(e.to_string()))
}
