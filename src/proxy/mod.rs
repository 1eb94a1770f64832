// src/proxy/mod.rs
mod metrics;
mod node;
mod origin_client;

pub use metrics::ProxyMetrics;
pub use node::ProxyNode;
pub use origin_client::{Fetched, OriginClient};
