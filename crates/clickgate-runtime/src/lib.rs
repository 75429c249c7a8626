//! # clickgate-runtime
//!
//! The request path between a caller and ClickHouse:
//!
//! ```text
//! run_query ──► StatementClassifier ──► authorize ──► EngineClient ──► QueryResult
//!                                          │
//!                                          └─ denied: GatewayError::PolicyDenied (engine not contacted)
//!
//! list_databases / list_tables ──► SchemaIntrospector ──► EngineClient (read-only)
//! ```
//!
//! Nothing here holds state between calls: the policy is fetched from its
//! provider on every request and schema is re-read from the engine every time.

pub mod adapter;
pub mod error;
pub mod gateway;
pub mod introspect;
pub mod page_token;

pub use adapter::{EngineClient, EngineFailure, QueryParams, QuerySettings, RawQueryResult};
pub use error::GatewayError;
pub use gateway::QueryGateway;
pub use introspect::{ListTablesRequest, PageLimits, SchemaIntrospector};
pub use page_token::PageCursor;
