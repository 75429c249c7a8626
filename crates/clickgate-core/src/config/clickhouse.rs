//! ClickHouse connection configuration.
//!
//! The engine is reached over its HTTP interface. Credentials can be given
//! inline or through an environment variable holding the password.

use serde::{Deserialize, Serialize};

/// Connection settings for the ClickHouse HTTP interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    /// Hostname of the ClickHouse server.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP(S) port. Defaults to 8123, or 8443 when `secure` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username sent with every request.
    #[serde(default = "default_username")]
    pub username: String,

    /// Password for the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable containing the password. Takes precedence over `password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Default database for unqualified table names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Use https.
    #[serde(default)]
    pub secure: bool,

    /// Verify the server certificate when `secure` is set.
    #[serde(default = "default_true")]
    pub verify: bool,

    /// Seconds allowed for establishing a connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Seconds allowed for a whole request/response exchange.
    #[serde(default = "default_send_receive_timeout")]
    pub send_receive_timeout_seconds: u64,

    /// Engine-side `max_execution_time` for every query, in seconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_seconds: u64,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            username: default_username(),
            password: None,
            password_env: None,
            database: None,
            secure: false,
            verify: true,
            connect_timeout_seconds: default_connect_timeout(),
            send_receive_timeout_seconds: default_send_receive_timeout(),
            query_timeout_seconds: default_query_timeout(),
        }
    }
}

impl ClickHouseConfig {
    /// The effective port.
    pub fn port(&self) -> u16 {
        match self.port {
            Some(port) => port,
            None if self.secure => 8443,
            None => 8123,
        }
    }

    /// Base URL of the HTTP interface, without a trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port())
    }

    /// Get the password, checking password_env first.
    pub fn password(&self) -> Option<String> {
        if let Some(env_var) = &self.password_env
            && let Ok(password) = std::env::var(env_var)
        {
            return Some(password);
        }
        self.password.clone()
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_username() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_send_receive_timeout() -> u64 {
    300
}

fn default_query_timeout() -> u64 {
    30
}
