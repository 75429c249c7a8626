//! Tool definitions and argument parsing.
//!
//! The server exposes a fixed set of three tools. Arguments are checked here,
//! before anything reaches the gateway.

use crate::error::McpError;
use crate::protocol::{ToolAnnotations, ToolDefinition};
use clickgate_runtime::ListTablesRequest;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

pub const LIST_DATABASES: &str = "list_databases";
pub const LIST_TABLES: &str = "list_tables";
pub const RUN_QUERY: &str = "run_query";

/// Registry of available MCP tools.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// The registry holding the gateway's tools.
    pub fn builtin(max_page_size: u32) -> Self {
        let mut registry = Self::new();
        registry.register(list_databases_tool());
        registry.register(list_tables_tool(max_page_size));
        registry.register(run_query_tool());
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: ToolDefinition) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tools, sorted by name.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        let mut tools: Vec<_> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn list_databases_tool() -> ToolDefinition {
    ToolDefinition {
        name: LIST_DATABASES.to_string(),
        description: Some("List all databases on the ClickHouse server.".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
        annotations: Some(ToolAnnotations {
            read_only: Some(true),
            destructive: Some(false),
        }),
    }
}

fn list_tables_tool(max_page_size: u32) -> ToolDefinition {
    ToolDefinition {
        name: LIST_TABLES.to_string(),
        description: Some(
            "List tables in a database with their comments and columns. \
             Results are paginated; pass next_page_token back as page_token to continue."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "database": {
                    "type": "string",
                    "description": "Database to list tables from"
                },
                "like": {
                    "type": "string",
                    "description": "Only tables whose name matches this LIKE pattern"
                },
                "not_like": {
                    "type": "string",
                    "description": "Exclude tables whose name matches this LIKE pattern"
                },
                "page_token": {
                    "type": "string",
                    "description": "Token from a previous call's next_page_token"
                },
                "page_size": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": max_page_size,
                    "description": "Tables per page"
                },
                "include_detailed_columns": {
                    "type": "boolean",
                    "description": "Include column details for each table (default true)"
                }
            },
            "required": ["database"]
        }),
        annotations: Some(ToolAnnotations {
            read_only: Some(true),
            destructive: Some(false),
        }),
    }
}

fn run_query_tool() -> ToolDefinition {
    ToolDefinition {
        name: RUN_QUERY.to_string(),
        description: Some(
            "Run a SQL query. Write and DROP statements are rejected unless the server \
             enables them with CLICKHOUSE_ALLOW_WRITE_ACCESS and CLICKHOUSE_ALLOW_DROP."
                .to_string(),
        ),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "SQL to execute"
                }
            },
            "required": ["query"]
        }),
        annotations: Some(ToolAnnotations {
            read_only: Some(false),
            destructive: Some(true),
        }),
    }
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ListDatabases,
    ListTables(ListTablesRequest),
    RunQuery { query: String },
}

impl ToolCall {
    /// Validate `arguments` for the tool called `name`.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, McpError> {
        let empty = Map::new();
        let args = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(invalid(name, "arguments must be an object")),
        };

        match name {
            LIST_DATABASES => Ok(ToolCall::ListDatabases),
            LIST_TABLES => parse_list_tables(args).map(ToolCall::ListTables),
            RUN_QUERY => {
                let query = required_string(RUN_QUERY, args, "query")?;
                if query.trim().is_empty() {
                    return Err(invalid(RUN_QUERY, "'query' must not be empty"));
                }
                Ok(ToolCall::RunQuery { query })
            }
            other => Err(McpError::ToolNotFound {
                name: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::ListDatabases => LIST_DATABASES,
            ToolCall::ListTables(_) => LIST_TABLES,
            ToolCall::RunQuery { .. } => RUN_QUERY,
        }
    }
}

fn parse_list_tables(args: &Map<String, Value>) -> Result<ListTablesRequest, McpError> {
    let database = required_string(LIST_TABLES, args, "database")?;
    let mut request = ListTablesRequest::new(database);

    if let Some(like) = optional_string(LIST_TABLES, args, "like")? {
        request = request.like(like);
    }
    if let Some(not_like) = optional_string(LIST_TABLES, args, "not_like")? {
        request = request.not_like(not_like);
    }
    if let Some(token) = optional_string(LIST_TABLES, args, "page_token")? {
        request = request.page_token(token);
    }

    match args.get("page_size") {
        None | Some(Value::Null) => {}
        Some(value) => {
            let size = value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| invalid(LIST_TABLES, "'page_size' must be a positive integer"))?;
            request = request.page_size(size);
        }
    }

    match args.get("include_detailed_columns") {
        None | Some(Value::Null) => {}
        Some(Value::Bool(include)) => request = request.include_detailed_columns(*include),
        Some(_) => {
            return Err(invalid(
                LIST_TABLES,
                "'include_detailed_columns' must be a boolean",
            ));
        }
    }

    Ok(request)
}

fn required_string(tool: &str, args: &Map<String, Value>, key: &str) -> Result<String, McpError> {
    optional_string(tool, args, key)?
        .ok_or_else(|| invalid(tool, format!("missing required argument '{}'", key)))
}

fn optional_string(
    tool: &str,
    args: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, McpError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(tool, format!("'{}' must be a string", key))),
    }
}

fn invalid(tool: &str, reason: impl Into<String>) -> McpError {
    McpError::InvalidArguments {
        tool: tool.to_string(),
        reason: reason.into(),
    }
}
