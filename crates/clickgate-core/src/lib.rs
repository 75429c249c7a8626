//! Shared types for the clickgate workspace.
//!
//! Everything that crosses a crate boundary lives here: the normalized result
//! shapes returned to callers and the configuration model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// Configuration types shared across all clickgate crates
pub mod config;

pub use config::{
    AccessConfig, ClickHouseConfig, ConfigError, GatewayConfig, McpConfig, Transport,
};

/// Result of a `run_query` call.
///
/// Column order is the engine's projection order and every row holds its
/// values in that same order, with native JSON types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    row_count: Option<u64>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>, row_count: Option<u64>) -> Self {
        Self {
            columns,
            rows,
            row_count,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> Option<u64> {
        self.row_count
    }

    /// Look up a column's position by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A column of a table as reported by `system.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub default_kind: String,
    #[serde(default)]
    pub default_expression: String,
}

/// A table as reported by `system.tables`, with its columns in definition order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub database: String,
    pub name: String,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub total_bytes: Option<u64>,
    #[serde(default)]
    pub primary_key: String,
    #[serde(default)]
    pub sorting_key: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Find a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// One page of a table listing.
///
/// `next_page_token` is serialized as `null` on the last page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableListPage {
    pub tables: Vec<TableDescriptor>,
    pub total_tables: u64,
    pub next_page_token: Option<String>,
}

impl TableListPage {
    /// The page returned when nothing matches the filter.
    pub fn empty() -> Self {
        Self {
            tables: Vec::new(),
            total_tables: 0,
            next_page_token: None,
        }
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}
