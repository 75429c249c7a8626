//! MCP server implementation.
//!
//! Dispatches JSON-RPC requests to the three gateway tools. The same
//! `McpServer` backs both transports.

use crate::error::{McpError, codes};
use crate::http_transport::HttpServer;
use crate::protocol::*;
use crate::tools::{ToolCall, ToolRegistry};
use clickgate_core::config::{McpConfig, Transport};
use clickgate_policy::PolicyProvider;
use clickgate_runtime::{
    EngineClient, EngineFailure, GatewayError, PageLimits, QueryGateway, SchemaIntrospector,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// The MCP server.
#[derive(Clone)]
pub struct McpServer {
    config: McpConfig,
    tools: ToolRegistry,
    engine: Arc<dyn EngineClient>,
    gateway: QueryGateway,
    introspector: SchemaIntrospector,
}

impl McpServer {
    pub fn new(
        config: McpConfig,
        engine: Arc<dyn EngineClient>,
        policy: Arc<dyn PolicyProvider>,
    ) -> Self {
        let limits = PageLimits::from(&config);
        Self {
            tools: ToolRegistry::builtin(limits.max_page_size),
            gateway: QueryGateway::new(engine.clone(), policy),
            introspector: SchemaIntrospector::new(engine.clone(), limits),
            engine,
            config,
        }
    }

    pub fn config(&self) -> &McpConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Ping the engine; used by the health endpoint.
    pub async fn engine_version(&self) -> Result<String, EngineFailure> {
        self.engine.ping().await
    }

    /// Start the MCP server on the configured transport.
    pub async fn run(&self) -> Result<(), McpError> {
        match self.config.transport {
            Transport::Stdio => self.run_stdio().await,
            Transport::Http => HttpServer::new(self.clone()).run().await,
        }
    }

    /// Serve line-delimited JSON-RPC on stdin/stdout until stdin closes.
    async fn run_stdio(&self) -> Result<(), McpError> {
        tracing::info!("Starting MCP server with stdio transport");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Unparseable JSON-RPC message");
                    Some(JsonRpcResponse::error(
                        None,
                        codes::PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            if let Some(response) = response {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, stopping MCP server");
        Ok(())
    }

    /// Handle a JSON-RPC message. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return None;
        }

        let id = request.id.clone();
        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                id,
                codes::INVALID_REQUEST,
                "jsonrpc must be \"2.0\"",
            ));
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" | "notifications/initialized" | "ping" => {
                JsonRpcResponse::success(id, json!({}))
            }
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => match self.handle_call_tool(request.params).await {
                Ok(result) => match serde_json::to_value(result) {
                    Ok(value) => JsonRpcResponse::success(id, value),
                    Err(e) => JsonRpcResponse::error(id, -32603, e.to_string()),
                },
                Err(e) => JsonRpcResponse::error(id, e.code(), e.to_string()),
            },
            "shutdown" => self.handle_shutdown(id),
            _ => JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": "clickgate",
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({ "tools": self.tools.list() });
        JsonRpcResponse::success(id, result)
    }

    /// Run a `tools/call`. Unknown tools and malformed params are protocol
    /// errors; everything else comes back as a tool result.
    pub async fn handle_call_tool(
        &self,
        params: Option<Value>,
    ) -> Result<CallToolResponse, McpError> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| McpError::InvalidRequest(format!("Invalid params: {}", e)))?,
            None => return Err(McpError::InvalidRequest("Missing params".to_string())),
        };

        if !self.tools.contains(&params.name) {
            return Err(McpError::ToolNotFound { name: params.name });
        }

        let call = match ToolCall::parse(&params.name, &params.arguments) {
            Ok(call) => call,
            Err(McpError::InvalidArguments { tool, reason }) => {
                tracing::debug!(tool = %tool, reason = %reason, "Rejected tool arguments");
                return Ok(CallToolResponse::failure(
                    "invalid_argument",
                    format!("Invalid argument: {}", reason),
                ));
            }
            Err(e) => return Err(e),
        };

        Ok(self.call(call).await)
    }

    async fn call(&self, call: ToolCall) -> CallToolResponse {
        let tool = call.name();
        let started = Instant::now();

        let response = match call {
            ToolCall::ListDatabases => to_response(self.introspector.list_databases().await),
            ToolCall::ListTables(request) => {
                to_response(self.introspector.list_tables(&request).await)
            }
            ToolCall::RunQuery { query } => to_response(self.gateway.run_query(&query).await),
        };

        tracing::info!(
            tool,
            is_error = response.is_error,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool call completed"
        );
        response
    }

    fn handle_shutdown(&self, id: Option<Value>) -> JsonRpcResponse {
        tracing::info!("MCP server shutdown requested");
        JsonRpcResponse::success(id, json!(null))
    }
}

fn to_response<T: Serialize>(result: Result<T, GatewayError>) -> CallToolResponse {
    match result {
        Ok(value) => match serde_json::to_value(value) {
            Ok(json) => CallToolResponse::success(json),
            Err(e) => CallToolResponse::failure("internal", format!("Failed to encode result: {}", e)),
        },
        Err(e) => {
            tracing::debug!(category = e.category(), error = %e, "Tool call failed");
            CallToolResponse::failure(e.category(), e.to_string())
        }
    }
}
