//! # clickgate-mcp
//!
//! MCP (Model Context Protocol) server exposing the gateway as three tools:
//!
//! | Tool | Description |
//! |------|-------------|
//! | `list_databases` | All database names |
//! | `list_tables` | Paginated tables of one database, with comments and columns |
//! | `run_query` | Run SQL behind the write/drop access policy |
//!
//! ```text
//! AI agent
//!       │ JSON-RPC (stdio or HTTP)
//!       ▼
//! ┌──────────────────────┐
//! │ McpServer            │
//! │  tools/call          │
//! │   ├─ ToolCall::parse │  argument validation
//! │   ├─ QueryGateway    │  classify → authorize → execute
//! │   └─ Introspector    │  system.tables / system.columns
//! └──────────┬───────────┘
//!            ▼
//!        ClickHouse
//! ```
//!
//! Tool failures are returned as results with `isError: true`; the JSON
//! content item carries `{category, message}`.

pub mod error;
pub mod http_transport;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::McpError;
pub use http_transport::{HttpServer, create_router};
pub use protocol::{
    CallToolParams, CallToolResponse, JsonRpcRequest, JsonRpcResponse, ToolAnnotations,
    ToolContent, ToolDefinition,
};
pub use server::McpServer;
pub use tools::{ToolCall, ToolRegistry};
