//! `clickgate query`: run one statement under the configured policy.

use anyhow::Result;
use clap::Args;
use clickgate_core::GatewayConfig;
use clickgate_runtime::QueryGateway;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// SQL to run.
    pub sql: String,
}

pub async fn execute(config: GatewayConfig, args: QueryArgs) -> Result<()> {
    let gateway = QueryGateway::new(super::connect(&config)?, super::policy(&config));
    let result = gateway.run_query(&args.sql).await?;
    super::print_json(&result)
}
