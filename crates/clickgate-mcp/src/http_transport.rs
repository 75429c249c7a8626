//! HTTP transport for the MCP server.
//!
//! `POST /mcp` takes one JSON-RPC message per request. `GET /health` pings
//! ClickHouse and reports its version, or 503 when it is unreachable.

use crate::error::{McpError, codes};
use crate::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::server::McpServer;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;

/// Shared state for the HTTP handlers.
pub struct HttpTransportState {
    server: McpServer,
    auth_token: Option<String>,
}

/// Create the HTTP router for MCP.
pub fn create_router(server: McpServer) -> Router {
    let state = Arc::new(HttpTransportState {
        auth_token: server.config().auth_token.clone().filter(|t| !t.is_empty()),
        server,
    });

    let mcp = Router::new()
        .route("/mcp", post(handle_mcp_post))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .merge(mcp)
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject `/mcp` calls without the configured bearer token.
async fn require_bearer(
    State(state): State<Arc<HttpTransportState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(expected) = &state.auth_token {
        let provided = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        let authorized =
            provided.is_some_and(|p| bool::from(p.as_bytes().ct_eq(expected.as_bytes())));
        if !authorized {
            tracing::warn!("Rejected MCP request with missing or wrong bearer token");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }
    Ok(next.run(req).await)
}

/// Handle POST requests to /mcp (JSON-RPC over HTTP).
async fn handle_mcp_post(State(state): State<Arc<HttpTransportState>>, body: Bytes) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error(
                    None,
                    codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                )),
            )
                .into_response();
        }
    };

    match state.server.handle_request(request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Handle health check requests.
async fn handle_health(State(state): State<Arc<HttpTransportState>>) -> impl IntoResponse {
    match state.server.engine_version().await {
        Ok(version) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "clickgate",
                "version": env!("CARGO_PKG_VERSION"),
                "clickhouse_version": version
            })),
        ),
        Err(failure) => {
            tracing::warn!(error = %failure, "Health check could not reach ClickHouse");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "service": "clickgate",
                    "error": failure.message
                })),
            )
        }
    }
}

/// HTTP server for MCP transport.
pub struct HttpServer {
    server: McpServer,
}

impl HttpServer {
    pub fn new(server: McpServer) -> Self {
        Self { server }
    }

    /// Run the HTTP server until Ctrl-C.
    pub async fn run(self) -> Result<(), McpError> {
        let addr = self.server.config().bind_addr();
        if self.server.config().auth_token.is_none() {
            tracing::warn!(addr = %addr, "HTTP transport has no auth_token; /mcp is open");
        }

        let app = create_router(self.server);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| McpError::StartupFailed(format!("Failed to bind to {}: {}", addr, e)))?;

        tracing::info!(addr = %addr, "MCP HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        return;
    }
    tracing::info!("Shutting down MCP HTTP server");
}
