use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "clickgate", version, about = "Policy-gated MCP gateway for ClickHouse")]
struct Cli {
    /// Configuration file. Missing files fall back to defaults plus environment.
    #[arg(
        long,
        global = true,
        env = "CLICKGATE_CONFIG",
        default_value = "clickgate.yaml"
    )]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server.
    Serve(commands::serve::ServeArgs),

    /// Ping ClickHouse and print its version.
    Check,

    /// Run one query through the gateway and print the result as JSON.
    Query(commands::query::QueryArgs),

    /// Print one page of a database's tables as JSON.
    Tables(commands::tables::TablesArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the stdio transport, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(&cli.config)?;

    match cli.cmd {
        Command::Serve(args) => commands::serve::execute(config, args).await?,
        Command::Check => commands::check::execute(config).await?,
        Command::Query(args) => commands::query::execute(config, args).await?,
        Command::Tables(args) => commands::tables::execute(config, args).await?,
    }

    Ok(())
}
