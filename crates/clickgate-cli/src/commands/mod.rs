//! CLI command implementations.

pub mod check;
pub mod query;
pub mod serve;
pub mod tables;

use anyhow::{Context, Result};
use clickgate_adapter_ch::ClickHouseHttpClient;
use clickgate_core::GatewayConfig;
use clickgate_policy::{AccessPolicy, EnvPolicy};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Load the config file (when present) and overlay the environment.
pub fn load_config(path: &Path) -> Result<GatewayConfig> {
    if !path.exists() {
        warn!(config = %path.display(), "Config file not found, using defaults");
    }
    GatewayConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

pub fn connect(config: &GatewayConfig) -> Result<Arc<ClickHouseHttpClient>> {
    let client = ClickHouseHttpClient::new(&config.clickhouse)
        .context("Failed to create ClickHouse client")?;
    Ok(Arc::new(client))
}

/// The request-time policy: environment flags over the configured defaults.
pub fn policy(config: &GatewayConfig) -> Arc<EnvPolicy> {
    Arc::new(EnvPolicy::new(AccessPolicy::from(config.access)))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
