//! Error types for the MCP crate.

use thiserror::Error;

/// JSON-RPC error codes used by the server.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
}

/// Errors that can occur in the MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to start the server.
    #[error("failed to start MCP server: {0}")]
    StartupFailed(String),

    /// Malformed request or params.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Tool not found.
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },

    /// Invalid arguments for tool.
    #[error("invalid arguments for tool {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// JSON-RPC error code for errors reported at the protocol level.
    pub fn code(&self) -> i32 {
        match self {
            McpError::InvalidRequest(_)
            | McpError::ToolNotFound { .. }
            | McpError::InvalidArguments { .. } => codes::INVALID_PARAMS,
            McpError::Serialization(_) => codes::PARSE_ERROR,
            _ => -32603,
        }
    }
}
