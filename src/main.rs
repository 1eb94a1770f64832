// src/main.rs
use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use cachecluster::balancer::Balancer;
use cachecluster::config;

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
    config.validate_balancer()?;

    let balancer = Arc::new(Balancer::new(&config.balancer));
    balancer.start_prober();

    let listener = TcpListener::bind(&config.balancer.listen).await?;
    balancer.run(listener).await
}
