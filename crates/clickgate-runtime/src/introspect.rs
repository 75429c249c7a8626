//! Schema introspection over ClickHouse system tables.
//!
//! Every query here runs read-only and takes user-supplied names and patterns
//! as server-side parameters only.

use crate::adapter::{EngineClient, QueryParams, QuerySettings, RawQueryResult};
use crate::error::GatewayError;
use crate::page_token::PageCursor;
use clickgate_core::config::McpConfig;
use clickgate_core::{ColumnDescriptor, TableDescriptor, TableListPage};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

mod queries {
    pub const LIST_DATABASES: &str = "SELECT name FROM system.databases ORDER BY name";

    pub const COUNT_TABLES: &str =
        "SELECT count() AS total FROM system.tables WHERE database = {database:String}";

    pub const PAGE_TABLES: &str = "SELECT name, engine, comment, total_rows, total_bytes, \
         primary_key, sorting_key FROM system.tables WHERE database = {database:String}";

    pub const TABLE_COLUMNS: &str = "SELECT table, name, type, comment, default_kind, \
         default_expression FROM system.columns \
         WHERE database = {database:String} AND table IN {tables:Array(String)} \
         ORDER BY table, position";

    pub const LIKE_FILTER: &str = " AND name LIKE {like:String}";
    pub const NOT_LIKE_FILTER: &str = " AND name NOT LIKE {not_like:String}";
    pub const AFTER_FILTER: &str = " AND name > {after:String}";
    pub const PAGE_ORDER: &str = " ORDER BY name LIMIT {limit:UInt64}";
}

/// Page size bounds for `list_tables`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
        }
    }
}

impl From<&McpConfig> for PageLimits {
    fn from(config: &McpConfig) -> Self {
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

/// Arguments of one `list_tables` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTablesRequest {
    pub database: String,
    pub like: Option<String>,
    pub not_like: Option<String>,
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
    pub include_detailed_columns: bool,
}

impl ListTablesRequest {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            like: None,
            not_like: None,
            page_size: None,
            page_token: None,
            include_detailed_columns: true,
        }
    }

    pub fn like(mut self, pattern: impl Into<String>) -> Self {
        self.like = Some(pattern.into());
        self
    }

    pub fn not_like(mut self, pattern: impl Into<String>) -> Self {
        self.not_like = Some(pattern.into());
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn include_detailed_columns(mut self, include: bool) -> Self {
        self.include_detailed_columns = include;
        self
    }
}

/// Reads databases and tables from the engine's system tables.
#[derive(Clone)]
pub struct SchemaIntrospector {
    engine: Arc<dyn EngineClient>,
    limits: PageLimits,
}

impl SchemaIntrospector {
    pub fn new(engine: Arc<dyn EngineClient>, limits: PageLimits) -> Self {
        Self { engine, limits }
    }

    pub fn limits(&self) -> PageLimits {
        self.limits
    }

    /// All database names, ascending.
    pub async fn list_databases(&self) -> Result<Vec<String>, GatewayError> {
        let raw = self.fetch(queries::LIST_DATABASES, QueryParams::new()).await?;
        let name = required_column(&raw, "name")?;

        let databases: Vec<String> = raw.rows.iter().map(|row| text(row, name)).collect();
        tracing::debug!(databases = databases.len(), "Listed databases");
        Ok(databases)
    }

    /// One page of the tables in `request.database`.
    pub async fn list_tables(
        &self,
        request: &ListTablesRequest,
    ) -> Result<TableListPage, GatewayError> {
        let database = request.database.trim();
        if database.is_empty() {
            return Err(GatewayError::invalid_argument("database must not be empty"));
        }
        let page_size = self.resolve_page_size(request.page_size)?;

        let like = request.like.as_deref();
        let not_like = request.not_like.as_deref();
        let cursor = request
            .page_token
            .as_deref()
            .map(|token| PageCursor::decode(token, database, like, not_like))
            .transpose()?;

        let mut filter = String::new();
        let mut params = QueryParams::new().with("database", database);
        if let Some(pattern) = like {
            filter.push_str(queries::LIKE_FILTER);
            params = params.with("like", pattern);
        }
        if let Some(pattern) = not_like {
            filter.push_str(queries::NOT_LIKE_FILTER);
            params = params.with("not_like", pattern);
        }

        let total_tables = self.count_tables(&filter, &params).await?;
        if total_tables == 0 {
            tracing::debug!(database = %database, "No tables match");
            return Ok(TableListPage::empty());
        }

        let mut page_sql = format!("{}{}", queries::PAGE_TABLES, filter);
        let mut page_params = params.with("limit", (u64::from(page_size) + 1).to_string());
        if let Some(cursor) = &cursor {
            page_sql.push_str(queries::AFTER_FILTER);
            page_params = page_params.with("after", cursor.after.as_str());
        }
        page_sql.push_str(queries::PAGE_ORDER);

        let raw = self.fetch(&page_sql, page_params).await?;
        let mut tables = read_tables(&raw, database)?;

        let has_more = tables.len() > page_size as usize;
        tables.truncate(page_size as usize);

        if request.include_detailed_columns && !tables.is_empty() {
            self.attach_columns(database, &mut tables).await?;
        }

        let offset = cursor.as_ref().map_or(0, |c| c.offset) + tables.len() as u64;
        let next_page_token = match tables.last() {
            Some(last) if has_more => {
                Some(PageCursor::new(database, like, not_like, last.name.as_str(), offset).encode())
            }
            _ => None,
        };

        tracing::info!(
            database = %database,
            page_size,
            tables = tables.len(),
            total_tables,
            has_more,
            "Listed tables"
        );

        Ok(TableListPage {
            tables,
            total_tables,
            next_page_token,
        })
    }

    fn resolve_page_size(&self, requested: Option<u32>) -> Result<u32, GatewayError> {
        let size = requested.unwrap_or(self.limits.default_page_size);
        if size == 0 || size > self.limits.max_page_size {
            return Err(GatewayError::invalid_argument(format!(
                "page_size must be between 1 and {}, got {}",
                self.limits.max_page_size, size
            )));
        }
        Ok(size)
    }

    async fn count_tables(&self, filter: &str, params: &QueryParams) -> Result<u64, GatewayError> {
        let sql = format!("{}{}", queries::COUNT_TABLES, filter);
        let raw = self.fetch(&sql, params.clone()).await?;
        let total = required_column(&raw, "total")?;

        raw.rows
            .first()
            .and_then(|row| number(row, total))
            .ok_or_else(|| GatewayError::IntrospectionFailed {
                detail: "table count query returned no value".to_string(),
            })
    }

    async fn attach_columns(
        &self,
        database: &str,
        tables: &mut [TableDescriptor],
    ) -> Result<(), GatewayError> {
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        let params = QueryParams::new()
            .with("database", database)
            .with_string_array("tables", &names);

        let raw = self.fetch(queries::TABLE_COLUMNS, params).await?;
        let mut by_table = read_columns(&raw)?;

        for table in tables.iter_mut() {
            table.columns = by_table.remove(&table.name).unwrap_or_default();
        }
        Ok(())
    }

    async fn fetch(&self, sql: &str, params: QueryParams) -> Result<RawQueryResult, GatewayError> {
        self.engine
            .execute(sql, &params, &QuerySettings::read_only())
            .await
            .map_err(|failure| {
                tracing::warn!(
                    code = ?failure.code,
                    error = %failure.message,
                    "Introspection query failed"
                );
                GatewayError::introspection_failed(failure)
            })
    }
}

fn read_tables(raw: &RawQueryResult, database: &str) -> Result<Vec<TableDescriptor>, GatewayError> {
    let name = required_column(raw, "name")?;
    let engine = raw.column_index("engine");
    let comment = raw.column_index("comment");
    let total_rows = raw.column_index("total_rows");
    let total_bytes = raw.column_index("total_bytes");
    let primary_key = raw.column_index("primary_key");
    let sorting_key = raw.column_index("sorting_key");

    Ok(raw
        .rows
        .iter()
        .map(|row| TableDescriptor {
            database: database.to_string(),
            name: text(row, name),
            engine: engine.map(|i| text(row, i)).unwrap_or_default(),
            comment: comment.map(|i| text(row, i)).unwrap_or_default(),
            total_rows: total_rows.and_then(|i| number(row, i)),
            total_bytes: total_bytes.and_then(|i| number(row, i)),
            primary_key: primary_key.map(|i| text(row, i)).unwrap_or_default(),
            sorting_key: sorting_key.map(|i| text(row, i)).unwrap_or_default(),
            columns: Vec::new(),
        })
        .collect())
}

/// Group column rows by table, keeping the engine's definition order.
fn read_columns(
    raw: &RawQueryResult,
) -> Result<HashMap<String, Vec<ColumnDescriptor>>, GatewayError> {
    let table = required_column(raw, "table")?;
    let name = required_column(raw, "name")?;
    let column_type = required_column(raw, "type")?;
    let comment = raw.column_index("comment");
    let default_kind = raw.column_index("default_kind");
    let default_expression = raw.column_index("default_expression");

    let mut grouped: HashMap<String, Vec<ColumnDescriptor>> = HashMap::new();
    for row in &raw.rows {
        grouped
            .entry(text(row, table))
            .or_default()
            .push(ColumnDescriptor {
                name: text(row, name),
                column_type: text(row, column_type),
                comment: comment.map(|i| text(row, i)).unwrap_or_default(),
                default_kind: default_kind.map(|i| text(row, i)).unwrap_or_default(),
                default_expression: default_expression.map(|i| text(row, i)).unwrap_or_default(),
            });
    }
    Ok(grouped)
}

fn required_column(raw: &RawQueryResult, name: &str) -> Result<usize, GatewayError> {
    raw.column_index(name)
        .ok_or_else(|| GatewayError::IntrospectionFailed {
            detail: format!("engine response is missing column '{}'", name),
        })
}

/// A cell as text; null and missing cells become "".
fn text(row: &[Value], index: usize) -> String {
    match row.get(index) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// A cell as an unsigned integer. 64-bit integers may arrive quoted.
fn number(row: &[Value], index: usize) -> Option<u64> {
    match row.get(index)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
