//! `clickgate tables`: print one page of a table listing.

use anyhow::Result;
use clap::Args;
use clickgate_core::GatewayConfig;
use clickgate_runtime::{ListTablesRequest, PageLimits, SchemaIntrospector};

#[derive(Debug, Args)]
pub struct TablesArgs {
    /// Database to list.
    pub database: String,

    /// Only tables matching this LIKE pattern.
    #[arg(long)]
    pub like: Option<String>,

    /// Skip tables matching this LIKE pattern.
    #[arg(long = "not-like")]
    pub not_like: Option<String>,

    #[arg(long = "page-size")]
    pub page_size: Option<u32>,

    /// Token printed as next_page_token by a previous call.
    #[arg(long = "page-token")]
    pub page_token: Option<String>,

    /// Leave out column details.
    #[arg(long = "no-columns", default_value_t = false)]
    pub no_columns: bool,
}

pub async fn execute(config: GatewayConfig, args: TablesArgs) -> Result<()> {
    let introspector =
        SchemaIntrospector::new(super::connect(&config)?, PageLimits::from(&config.mcp));

    let mut request =
        ListTablesRequest::new(args.database).include_detailed_columns(!args.no_columns);
    if let Some(like) = args.like {
        request = request.like(like);
    }
    if let Some(not_like) = args.not_like {
        request = request.not_like(not_like);
    }
    if let Some(size) = args.page_size {
        request = request.page_size(size);
    }
    if let Some(token) = args.page_token {
        request = request.page_token(token);
    }

    let page = introspector.list_tables(&request).await?;
    super::print_json(&page)
}
