//! Configuration types for clickgate.
//!
//! Configuration is layered, lowest precedence first:
//!
//! 1. Built-in defaults (every field has one, so an empty file is valid)
//! 2. `clickgate.yaml`
//! 3. `CLICKHOUSE_*` environment variables
//! 4. Command-line flags (applied by the binary)

pub mod access;
pub mod clickhouse;
pub mod mcp;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use access::{ALLOW_DROP_ENV, ALLOW_WRITE_ACCESS_ENV, AccessConfig};
pub use clickhouse::ClickHouseConfig;
pub use mcp::{McpConfig, Transport};

/// Complete gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// ClickHouse connection.
    #[serde(default)]
    pub clickhouse: ClickHouseConfig,

    /// Write/drop access flags.
    #[serde(default)]
    pub access: AccessConfig,

    /// MCP server settings.
    #[serde(default)]
    pub mcp: McpConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, then overlay the process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mcp.max_page_size == 0 {
            return Err(ConfigError::invalid(
                "mcp.max_page_size",
                "must be at least 1",
            ));
        }
        if self.mcp.default_page_size == 0 {
            return Err(ConfigError::invalid(
                "mcp.default_page_size",
                "must be at least 1",
            ));
        }
        if self.mcp.default_page_size > self.mcp.max_page_size {
            return Err(ConfigError::invalid(
                "mcp.default_page_size",
                format!(
                    "{} exceeds mcp.max_page_size ({})",
                    self.mcp.default_page_size, self.mcp.max_page_size
                ),
            ));
        }
        Ok(())
    }

    /// Overlay `CLICKHOUSE_*` variables resolved through `lookup`.
    ///
    /// Unset or empty variables leave the current value untouched.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("CLICKHOUSE_HOST") {
            self.clickhouse.host = host;
        }
        if let Some(port) = get("CLICKHOUSE_PORT") {
            self.clickhouse.port = Some(parse_number("CLICKHOUSE_PORT", &port)?);
        }
        if let Some(user) = get("CLICKHOUSE_USER") {
            self.clickhouse.username = user;
        }
        if let Some(password) = get("CLICKHOUSE_PASSWORD") {
            self.clickhouse.password = Some(password);
        }
        if let Some(database) = get("CLICKHOUSE_DATABASE") {
            self.clickhouse.database = Some(database);
        }
        if let Some(secure) = get("CLICKHOUSE_SECURE") {
            self.clickhouse.secure = parse_bool("CLICKHOUSE_SECURE", &secure)?;
        }
        if let Some(verify) = get("CLICKHOUSE_VERIFY") {
            self.clickhouse.verify = parse_bool("CLICKHOUSE_VERIFY", &verify)?;
        }
        if let Some(timeout) = get("CLICKHOUSE_CONNECT_TIMEOUT") {
            self.clickhouse.connect_timeout_seconds =
                parse_number("CLICKHOUSE_CONNECT_TIMEOUT", &timeout)?;
        }
        if let Some(timeout) = get("CLICKHOUSE_SEND_RECEIVE_TIMEOUT") {
            self.clickhouse.send_receive_timeout_seconds =
                parse_number("CLICKHOUSE_SEND_RECEIVE_TIMEOUT", &timeout)?;
        }
        if let Some(timeout) = get("CLICKHOUSE_MCP_QUERY_TIMEOUT") {
            self.clickhouse.query_timeout_seconds =
                parse_number("CLICKHOUSE_MCP_QUERY_TIMEOUT", &timeout)?;
        }

        if let Some(write) = get(ALLOW_WRITE_ACCESS_ENV) {
            self.access.allow_write_access = parse_bool(ALLOW_WRITE_ACCESS_ENV, &write)?;
        }
        if let Some(drop) = get(ALLOW_DROP_ENV) {
            self.access.allow_drop = parse_bool(ALLOW_DROP_ENV, &drop)?;
        }

        if let Some(transport) = get("CLICKHOUSE_MCP_SERVER_TRANSPORT") {
            self.mcp.transport = transport
                .parse()
                .map_err(|e: String| ConfigError::invalid("CLICKHOUSE_MCP_SERVER_TRANSPORT", e))?;
        }
        if let Some(host) = get("CLICKHOUSE_MCP_BIND_HOST") {
            self.mcp.host = host;
        }
        if let Some(port) = get("CLICKHOUSE_MCP_BIND_PORT") {
            self.mcp.port = parse_number("CLICKHOUSE_MCP_BIND_PORT", &port)?;
        }
        if let Some(token) = get("CLICKHOUSE_MCP_AUTH_TOKEN") {
            self.mcp.auth_token = Some(token);
        }

        Ok(())
    }
}

/// Parse a boolean flag the way the `CLICKHOUSE_*` variables are written.
pub fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid(
            key,
            format!("expected a boolean, got '{}'", other),
        )),
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string()))
}
