//! In-memory engine used by the gateway and introspector tests.

#![allow(dead_code)]

use async_trait::async_trait;
use clickgate_runtime::{EngineClient, EngineFailure, QueryParams, QuerySettings, RawQueryResult};
use serde_json::{Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct FakeColumn {
    pub name: String,
    pub column_type: String,
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct FakeTable {
    pub comment: String,
    pub columns: Vec<FakeColumn>,
}

/// A call the fake engine received.
#[derive(Debug, Clone)]
pub struct ExecutedQuery {
    pub query: String,
    pub params: QueryParams,
    pub settings: QuerySettings,
}

/// Serves `system.*` introspection queries from an in-memory catalog and
/// answers everything else from a script.
#[derive(Default)]
pub struct FakeEngine {
    catalog: Mutex<BTreeMap<String, BTreeMap<String, FakeTable>>>,
    scripted: Mutex<VecDeque<Result<RawQueryResult, EngineFailure>>>,
    failure: Mutex<Option<EngineFailure>>,
    executed: Mutex<Vec<ExecutedQuery>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(self, database: &str) -> Self {
        self.catalog
            .lock()
            .unwrap()
            .entry(database.to_string())
            .or_default();
        self
    }

    pub fn with_table(self, database: &str, table: &str, comment: &str) -> Self {
        self.with_table_columns(database, table, comment, &[("id", "UInt32", "")])
    }

    pub fn with_table_columns(
        self,
        database: &str,
        table: &str,
        comment: &str,
        columns: &[(&str, &str, &str)],
    ) -> Self {
        let columns = columns
            .iter()
            .map(|(name, column_type, comment)| FakeColumn {
                name: name.to_string(),
                column_type: column_type.to_string(),
                comment: comment.to_string(),
            })
            .collect();
        self.catalog
            .lock()
            .unwrap()
            .entry(database.to_string())
            .or_default()
            .insert(
                table.to_string(),
                FakeTable {
                    comment: comment.to_string(),
                    columns,
                },
            );
        self
    }

    pub fn drop_table(&self, database: &str, table: &str) {
        if let Some(tables) = self.catalog.lock().unwrap().get_mut(database) {
            tables.remove(table);
        }
    }

    /// Queue the answer to the next non-introspection query.
    pub fn push_result(&self, result: RawQueryResult) {
        self.scripted.lock().unwrap().push_back(Ok(result));
    }

    pub fn push_failure(&self, message: &str) {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Err(EngineFailure::new(message)));
    }

    /// Make every call fail from now on.
    pub fn fail_everything(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(EngineFailure::new(message));
    }

    pub fn executed(&self) -> Vec<ExecutedQuery> {
        self.executed.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    fn matching_tables(&self, params: &QueryParams) -> Vec<(String, FakeTable)> {
        let database = scalar(params, "database").unwrap_or_default();
        let like = scalar(params, "like");
        let not_like = scalar(params, "not_like");
        let after = scalar(params, "after");

        let catalog = self.catalog.lock().unwrap();
        let Some(tables) = catalog.get(&database) else {
            return Vec::new();
        };

        tables
            .iter()
            .filter(|(name, _)| like.as_deref().is_none_or(|p| like_match(p, name)))
            .filter(|(name, _)| not_like.as_deref().is_none_or(|p| !like_match(p, name)))
            .filter(|(name, _)| after.as_deref().is_none_or(|a| name.as_str() > a))
            .map(|(name, table)| (name.clone(), table.clone()))
            .collect()
    }

    fn introspect(&self, query: &str, params: &QueryParams) -> Option<RawQueryResult> {
        if query.contains("system.databases") {
            let rows = self
                .catalog
                .lock()
                .unwrap()
                .keys()
                .map(|name| vec![json!(name)])
                .collect();
            return Some(result(&["name"], rows));
        }

        if query.contains("count()") && query.contains("system.tables") {
            let total = self.matching_tables(params).len();
            return Some(result(&["total"], vec![vec![json!(total)]]));
        }

        if query.contains("system.tables") {
            let limit: usize = params
                .get("limit")
                .and_then(|l| l.parse().ok())
                .unwrap_or(usize::MAX);
            let rows = self
                .matching_tables(params)
                .into_iter()
                .take(limit)
                .map(|(name, table)| {
                    vec![
                        json!(name),
                        json!("MergeTree"),
                        json!(table.comment),
                        json!(0),
                        json!(0),
                        json!("id"),
                        json!("id"),
                    ]
                })
                .collect();
            return Some(result(
                &[
                    "name",
                    "engine",
                    "comment",
                    "total_rows",
                    "total_bytes",
                    "primary_key",
                    "sorting_key",
                ],
                rows,
            ));
        }

        if query.contains("system.columns") {
            let database = scalar(params, "database").unwrap_or_default();
            let wanted = parse_string_array(params.get("tables").unwrap_or("[]"));
            let catalog = self.catalog.lock().unwrap();
            let mut rows = Vec::new();
            if let Some(tables) = catalog.get(&database) {
                for (table_name, table) in tables {
                    if !wanted.contains(table_name) {
                        continue;
                    }
                    for column in &table.columns {
                        rows.push(vec![
                            json!(table_name),
                            json!(column.name),
                            json!(column.column_type),
                            json!(column.comment),
                            json!(""),
                            json!(""),
                        ]);
                    }
                }
            }
            return Some(result(
                &[
                    "table",
                    "name",
                    "type",
                    "comment",
                    "default_kind",
                    "default_expression",
                ],
                rows,
            ));
        }

        None
    }
}

#[async_trait]
impl EngineClient for FakeEngine {
    async fn execute(
        &self,
        query: &str,
        params: &QueryParams,
        settings: &QuerySettings,
    ) -> Result<RawQueryResult, EngineFailure> {
        self.executed.lock().unwrap().push(ExecutedQuery {
            query: query.to_string(),
            params: params.clone(),
            settings: *settings,
        });

        if let Some(failure) = self.failure.lock().unwrap().clone() {
            return Err(failure);
        }

        if let Some(raw) = self.introspect(query, params) {
            return Ok(raw);
        }

        self.scripted
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RawQueryResult::default()))
    }

    async fn ping(&self) -> Result<String, EngineFailure> {
        match self.failure.lock().unwrap().clone() {
            Some(failure) => Err(failure),
            None => Ok("24.8.1.1".to_string()),
        }
    }
}

pub fn result(columns: &[&str], rows: Vec<Vec<Value>>) -> RawQueryResult {
    RawQueryResult {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        types: Vec::new(),
        row_count: Some(rows.len() as u64),
        rows,
    }
}

/// SQL LIKE: `%` any run, `_` any single character, `\` escapes.
pub fn like_match(pattern: &str, value: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();
    like_from(&pattern, &value)
}

fn like_from(pattern: &[char], value: &[char]) -> bool {
    match pattern.first() {
        None => value.is_empty(),
        Some('%') => (0..=value.len()).any(|skip| like_from(&pattern[1..], &value[skip..])),
        Some('_') => !value.is_empty() && like_from(&pattern[1..], &value[1..]),
        Some('\\') if pattern.len() > 1 => {
            value.first() == Some(&pattern[1]) && like_from(&pattern[2..], &value[1..])
        }
        Some(c) => value.first() == Some(c) && like_from(&pattern[1..], &value[1..]),
    }
}

/// Parse the `['a','b']` text form of an `Array(String)` parameter.
/// Read a scalar parameter back out of the engine's escaped text format.
fn scalar(params: &QueryParams, name: &str) -> Option<String> {
    let raw = params.get(name)?;
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Some(out)
}

fn parse_string_array(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match (in_string, c) {
            (false, '\'') => in_string = true,
            (true, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (true, '\'') => {
                in_string = false;
                items.push(std::mem::take(&mut current));
            }
            (true, c) => current.push(c),
            _ => {}
        }
    }
    items
}
