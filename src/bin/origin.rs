// src/bin/origin.rs
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use cachecluster::config;
use cachecluster::origin::OriginServer;

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

    info!("Loading configuration from: {}", config_path);
    let config = config::load_config(&config_path).await?;

    let server = Arc::new(OriginServer::new(config.origin.data_dir.clone()));
    let listener = TcpListener::bind(&config.origin.listen).await?;
    server.run(listener).await
}
