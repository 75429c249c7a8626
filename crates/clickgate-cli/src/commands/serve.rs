//! `clickgate serve`: run the MCP server.

use anyhow::{Context, Result};
use clap::Args;
use clickgate_core::GatewayConfig;
use clickgate_core::config::Transport;
use clickgate_mcp::McpServer;
use tracing::info;

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Transport type (stdio or http). Overrides config and environment.
    #[arg(long)]
    pub transport: Option<String>,

    /// HTTP bind host. Overrides config and environment.
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP port. Overrides config and environment.
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn execute(mut config: GatewayConfig, args: ServeArgs) -> Result<()> {
    if let Some(transport) = args.transport.as_deref() {
        config.mcp.transport = transport
            .parse::<Transport>()
            .map_err(anyhow::Error::msg)?;
    }
    if let Some(host) = args.host {
        config.mcp.host = host;
    }
    if let Some(port) = args.port {
        config.mcp.port = port;
    }

    let engine = super::connect(&config)?;
    let policy = super::policy(&config);

    info!(
        transport = %config.mcp.transport,
        clickhouse = %config.clickhouse.base_url(),
        allow_write_access = config.access.allow_write_access,
        allow_drop = config.access.allow_drop,
        "Starting clickgate"
    );

    let server = McpServer::new(config.mcp.clone(), engine, policy);
    server.run().await.context("MCP server failed")
}
