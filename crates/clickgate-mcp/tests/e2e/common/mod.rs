//! Shared test infrastructure for clickgate end-to-end tests.
//!
//! This module provides:
//! - Docker container management for ClickHouse
//! - Server construction with a chosen access policy
//! - Helpers for calling tools and reading their results

use clickgate_adapter_ch::ClickHouseHttpClient;
use clickgate_core::config::{ClickHouseConfig, McpConfig};
use clickgate_mcp::{CallToolResponse, McpServer};
use clickgate_policy::AccessPolicy;
use clickgate_runtime::{EngineClient, QueryParams, QuerySettings};
use serde_json::{Value, json};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// DOCKER CONTAINER CONFIGURATION
// =============================================================================

pub const CONTAINER_NAME: &str = "clickgate_test_clickhouse";
pub const CLICKHOUSE_PORT: u16 = 18123;
pub const CLICKHOUSE_USER: &str = "clickgate";
pub const CLICKHOUSE_PASSWORD: &str = "clickgate_test_password";
pub const IMAGE: &str = "clickhouse/clickhouse-server:24.8";

pub fn clickhouse_config() -> ClickHouseConfig {
    ClickHouseConfig {
        host: "localhost".to_string(),
        port: Some(CLICKHOUSE_PORT),
        username: CLICKHOUSE_USER.to_string(),
        password: Some(CLICKHOUSE_PASSWORD.to_string()),
        ..Default::default()
    }
}

// =============================================================================
// DOCKER CONTAINER MANAGEMENT
// =============================================================================

/// Start a ClickHouse container for testing
pub fn start_clickhouse_container() -> Result<(), String> {
    let output = Command::new("docker")
        .args(["ps", "-a", "-q", "-f", &format!("name={}", CONTAINER_NAME)])
        .output()
        .map_err(|e| format!("Failed to check existing container: {}", e))?;

    if !String::from_utf8_lossy(&output.stdout).trim().is_empty() {
        let _ = Command::new("docker")
            .args(["rm", "-f", CONTAINER_NAME])
            .output();
    }

    let status = Command::new("docker")
        .args([
            "run",
            "-d",
            "--name",
            CONTAINER_NAME,
            "-e",
            &format!("CLICKHOUSE_USER={}", CLICKHOUSE_USER),
            "-e",
            &format!("CLICKHOUSE_PASSWORD={}", CLICKHOUSE_PASSWORD),
            "-e",
            "CLICKHOUSE_DEFAULT_ACCESS_MANAGEMENT=1",
            "-p",
            &format!("{}:8123", CLICKHOUSE_PORT),
            IMAGE,
        ])
        .status()
        .map_err(|e| format!("Failed to start container: {}", e))?;

    if !status.success() {
        return Err("Failed to start ClickHouse container".to_string());
    }
    Ok(())
}

/// Stop and remove the ClickHouse container
pub fn stop_clickhouse_container() {
    let _ = Command::new("docker")
        .args(["rm", "-f", CONTAINER_NAME])
        .output();
}

/// Wait for ClickHouse to answer queries
pub async fn wait_for_clickhouse(client: &ClickHouseHttpClient) -> Result<(), String> {
    for attempt in 1..=60 {
        match client.ping().await {
            Ok(version) => {
                println!("✅ ClickHouse {} ready after {} attempts", version, attempt);
                return Ok(());
            }
            Err(_) => {
                if attempt % 10 == 0 {
                    println!("⏳ Waiting for ClickHouse... (attempt {})", attempt);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    Err("ClickHouse did not become ready in time".to_string())
}

// =============================================================================
// TEST CONTEXT
// =============================================================================

pub struct TestContext {
    pub client: Arc<ClickHouseHttpClient>,
}

impl TestContext {
    pub async fn setup() -> Result<Self, String> {
        let client = ClickHouseHttpClient::new(&clickhouse_config())
            .map_err(|e| format!("Failed to build client: {}", e))?;
        start_clickhouse_container()?;
        wait_for_clickhouse(&client).await?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// A server running under `policy`.
    pub fn server(&self, policy: AccessPolicy) -> McpServer {
        McpServer::new(McpConfig::default(), self.client.clone(), Arc::new(policy))
    }

    /// Run setup SQL directly, bypassing the gateway.
    pub async fn admin(&self, sql: &str) {
        self.client
            .execute(sql, &QueryParams::new(), &QuerySettings::default())
            .await
            .unwrap_or_else(|e| panic!("admin query failed: {}\n{}", sql, e));
    }

    /// Create a fresh, empty database.
    pub async fn fresh_database(&self, name: &str) {
        self.admin(&format!("DROP DATABASE IF EXISTS {}", name)).await;
        self.admin(&format!("CREATE DATABASE {}", name)).await;
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        stop_clickhouse_container();
        println!("🧹 Cleaned up ClickHouse container");
    }
}

// =============================================================================
// RESULT HELPERS
// =============================================================================

pub async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> CallToolResponse {
    server
        .handle_call_tool(Some(json!({ "name": name, "arguments": arguments })))
        .await
        .unwrap_or_else(|e| panic!("tools/call {} failed at protocol level: {}", name, e))
}

/// Assert that a result is successful and return its JSON payload
pub fn expect_success(result: &CallToolResponse, msg: &str) -> Value {
    assert!(!result.is_error, "{}: {:?}", msg, result.text());
    result.json().cloned().expect("successful result carries JSON")
}

/// Assert that a result is a tool error and return its message
pub fn expect_error(result: &CallToolResponse, category: &str, msg: &str) -> String {
    assert!(result.is_error, "{}: expected an error, got {:?}", msg, result.json());
    let json = result.json().expect("error result carries JSON");
    assert_eq!(json["category"], category, "{}", msg);
    result.text().unwrap_or_default().to_string()
}
