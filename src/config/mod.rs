// src/config/mod.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cluster-wide configuration. One file describes all three components; each
/// binary reads the section it needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub origin: OriginConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub balancer: BalancerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OriginConfig {
    #[serde(default = "default_origin_listen")]
    pub listen: String,
    /// Directory holding `<resource><key>.json` files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_listen")]
    pub listen: String,
    #[serde(default = "default_origin_listen")]
    pub origin: String,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub kind: CacheKind,
    /// Uniform entry lifetime for the TTL policy, in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Maximum entry count for the LRU policy.
    #[serde(default = "default_lru_capacity")]
    pub lru_capacity: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    Ttl,
    Lru,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalancerConfig {
    #[serde(default = "default_balancer_listen")]
    pub listen: String,
    #[serde(default)]
    pub proxies: Vec<String>,
    #[serde(default)]
    pub strategy: Strategy,
    /// Consecutive failures before a proxy is marked unhealthy.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    RoundRobin,
    LeastLoaded,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "round_robin",
            Strategy::LeastLoaded => "least_loaded",
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl BalancerConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }
}

fn default_origin_listen() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_proxy_listen() -> String {
    "127.0.0.1:9000".to_string()
}
fn default_balancer_listen() -> String {
    "127.0.0.1:7000".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_ttl_secs() -> u64 {
    30
}
fn default_lru_capacity() -> usize {
    3
}
fn default_failure_threshold() -> u32 {
    3
}
fn default_probe_interval_secs() -> u64 {
    2
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            listen: default_origin_listen(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: default_proxy_listen(),
            origin: default_origin_listen(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: CacheKind::default(),
            ttl_secs: default_ttl_secs(),
            lru_capacity: default_lru_capacity(),
        }
    }
}

impl Default for CacheKind {
    fn default() -> Self {
        CacheKind::Ttl
    }
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            listen: default_balancer_listen(),
            proxies: Vec::new(),
            strategy: Strategy::default(),
            failure_threshold: default_failure_threshold(),
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::RoundRobin
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.proxy.cache.ttl_secs == 0 {
            bail!("proxy.cache.ttl_secs must be greater than zero");
        }
        if self.proxy.cache.lru_capacity == 0 {
            bail!("proxy.cache.lru_capacity must be greater than zero");
        }
        if self.balancer.failure_threshold == 0 {
            bail!("balancer.failure_threshold must be greater than zero");
        }
        if self.balancer.probe_interval_secs == 0 {
            bail!("balancer.probe_interval_secs must be greater than zero");
        }
        Ok(())
    }

    /// The balancer additionally needs at least one proxy to route to.
    pub fn validate_balancer(&self) -> Result<()> {
        self.validate()?;
        if self.balancer.proxies.is_empty() {
            bail!("balancer.proxies must list at least one proxy address");
        }
        Ok(())
    }
}

/// Load configuration from a file (YAML or JSON, by extension).
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .context("Failed to read config file")?;

    let ext = path.extension().and_then(|s| s.to_str());
    let config: Config = if ext == Some("yaml") || ext == Some("yml") {
        serde_yaml::from_str(&contents).context("Failed to parse YAML config")?
    } else {
        serde_json::from_str(&contents).context("Failed to parse JSON config")?
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.proxy.cache.kind, CacheKind::Ttl);
        assert_eq!(config.proxy.cache.ttl_secs, 30);
        assert_eq!(config.proxy.cache.lru_capacity, 3);
        assert_eq!(config.balancer.strategy, Strategy::RoundRobin);
        assert_eq!(config.balancer.failure_threshold, 3);
        assert_eq!(config.balancer.probe_interval_secs, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_yaml() {
        let yaml = r#"
balancer:
  listen: "127.0.0.1:7100"
  proxies: ["127.0.0.1:9001", "127.0.0.1:9002"]
  strategy: least_loaded
  failure_threshold: 5
proxy:
  cache:
    kind: lru
    lru_capacity: 16
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.balancer.strategy, Strategy::LeastLoaded);
        assert_eq!(config.balancer.proxies.len(), 2);
        assert_eq!(config.balancer.failure_threshold, 5);
        assert_eq!(config.proxy.cache.kind, CacheKind::Lru);
        assert_eq!(config.proxy.cache.lru_capacity, 16);
        assert!(config.validate_balancer().is_ok());
    }

    #[test]
    fn empty_proxy_list_rejected_for_balancer() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.validate_balancer().is_err());
    }

    #[test]
    fn zero_capacity_rejected() {
        let yaml = "proxy:\n  cache:\n    lru_capacity: 0\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn strategy_names() {
        assert_eq!(Strategy::RoundRobin.name(), "round_robin");
        assert_eq!(Strategy::LeastLoaded.name(), "least_loaded");
    }
}
