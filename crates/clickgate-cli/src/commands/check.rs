//! `clickgate check`: verify the ClickHouse connection.

use anyhow::{Result, anyhow};
use clickgate_core::GatewayConfig;
use clickgate_runtime::EngineClient;

pub async fn execute(config: GatewayConfig) -> Result<()> {
    let client = super::connect(&config)?;

    let version = client.ping().await.map_err(|e| {
        anyhow!(
            "Cannot reach ClickHouse at {}: {}",
            config.clickhouse.base_url(),
            e
        )
    })?;

    println!(
        "✓ Connected to ClickHouse {} at {}",
        version,
        config.clickhouse.base_url()
    );
    Ok(())
}
