// src/bin/proxy.rs
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use cachecluster::cache;
use cachecluster::config;
use cachecluster::proxy::{OriginClient, ProxyNode};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cachecluster=debug".parse()?),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    // A cluster runs several proxies off one config file; the listen address
    // can be overridden per instance.
    let listen = std::env::args().nth(2);

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;
    let listen = listen.unwrap_or_else(|| config.proxy.listen.clone());

    let listener = TcpListener::bind(&listen).await?;
    let port = listener.local_addr()?.port();

    let engine = cache::build_cache(&config.proxy.cache);
    let origin = OriginClient::new(config.proxy.origin.clone());
    let node = Arc::new(ProxyNode::new(port, engine, origin));
    node.run(listener).await
}
