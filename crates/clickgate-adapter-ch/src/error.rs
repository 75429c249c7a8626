/// Failures building a ClickHouse client.
///
/// Query-time failures are reported as `EngineFailure` instead.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid ClickHouse configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
