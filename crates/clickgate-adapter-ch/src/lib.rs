//! ClickHouse implementation of `EngineClient` over the HTTP interface.
//!
//! Each call is one HTTP request; `reqwest` owns connection reuse. Results are
//! requested as `JSONCompact` with 64-bit integers unquoted so values keep
//! their native JSON types.

use async_trait::async_trait;
use clickgate_core::config::ClickHouseConfig;
use clickgate_runtime::{EngineClient, EngineFailure, QueryParams, QuerySettings, RawQueryResult};
use std::time::{Duration, Instant};

mod error;
mod response;

pub use error::ClientError;

const USER_HEADER: &str = "X-ClickHouse-User";
const KEY_HEADER: &str = "X-ClickHouse-Key";
const EXCEPTION_CODE_HEADER: &str = "X-ClickHouse-Exception-Code";

/// HTTP client for one ClickHouse server.
#[derive(Clone)]
pub struct ClickHouseHttpClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: Option<String>,
    database: Option<String>,
    max_execution_time: u64,
}

impl ClickHouseHttpClient {
    pub fn new(config: &ClickHouseConfig) -> Result<Self, ClientError> {
        if config.host.trim().is_empty() {
            return Err(ClientError::InvalidConfig("host must not be empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.send_receive_timeout_seconds))
            .danger_accept_invalid_certs(config.secure && !config.verify)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password(),
            database: config.database.clone().filter(|d| !d.is_empty()),
            max_execution_time: config.query_timeout_seconds,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL query string for one request.
    fn query_pairs(&self, params: &QueryParams, settings: &QuerySettings) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("default_format".to_string(), "JSONCompact".to_string()),
            (
                "output_format_json_quote_64bit_integers".to_string(),
                "0".to_string(),
            ),
            ("wait_end_of_query".to_string(), "1".to_string()),
        ];

        if self.max_execution_time > 0 {
            pairs.push((
                "max_execution_time".to_string(),
                self.max_execution_time.to_string(),
            ));
        }

        // readonly=2 still lets the request carry the settings above.
        if settings.readonly {
            pairs.push(("readonly".to_string(), "2".to_string()));
        }

        if let Some(database) = &self.database {
            pairs.push(("database".to_string(), database.clone()));
        }

        pairs.extend(
            params
                .iter()
                .map(|(name, value)| (format!("param_{}", name), value.to_string())),
        );
        pairs
    }
}

#[async_trait]
impl EngineClient for ClickHouseHttpClient {
    async fn execute(
        &self,
        query: &str,
        params: &QueryParams,
        settings: &QuerySettings,
    ) -> Result<RawQueryResult, EngineFailure> {
        let started = Instant::now();

        let mut request = self
            .http
            .post(format!("{}/", self.base_url))
            .query(&self.query_pairs(params, settings))
            .header(USER_HEADER, &self.username)
            .body(query.to_string());
        if let Some(password) = &self.password {
            request = request.header(KEY_HEADER, password);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(url = %self.base_url, error = %e, "ClickHouse request failed");
            EngineFailure::new(format!("Failed to reach ClickHouse at {}: {}", self.base_url, e))
        })?;

        let status = response.status();
        let exception_code = response
            .headers()
            .get(EXCEPTION_CODE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| EngineFailure::new(format!("Failed to read ClickHouse response: {}", e)))?;

        if !status.is_success() {
            return Err(response::failure(
                status.as_u16(),
                exception_code.as_deref(),
                &body,
            ));
        }

        let raw = response::parse_body(&body)?;
        tracing::debug!(
            status = status.as_u16(),
            rows = raw.rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ClickHouse request completed"
        );
        Ok(raw)
    }

    async fn ping(&self) -> Result<String, EngineFailure> {
        let raw = self
            .execute(
                "SELECT version() AS version",
                &QueryParams::new(),
                &QuerySettings::read_only(),
            )
            .await?;

        raw.rows
            .first()
            .and_then(|row| row.first())
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| EngineFailure::new("ClickHouse did not report a version"))
    }
}
