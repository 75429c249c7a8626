//! The seam between the gateway and a database engine.

use async_trait::async_trait;
use serde_json::Value;

/// Columns and rows exactly as the engine produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQueryResult {
    pub columns: Vec<String>,
    /// Engine type names, parallel to `columns`.
    pub types: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: Option<u64>,
}

impl RawQueryResult {
    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Any failure reported by, or on the way to, the engine.
///
/// `message` is the engine's own text, untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineFailure {
    pub message: String,
    /// Engine exception code, when the engine reported one.
    pub code: Option<i32>,
}

impl EngineFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }
}

/// Named server-side query parameters (`{name:Type}` placeholders).
///
/// Values are sent in the engine's text format and never spliced into the
/// query text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a scalar parameter. The value is stored in the engine's escaped
    /// text format, so backslashes and control characters survive transport.
    pub fn with(self, name: impl Into<String>, value: impl AsRef<str>) -> Self {
        let escaped = escape_text(value.as_ref(), false);
        self.push(name, escaped)
    }

    /// Add an `Array(String)` parameter.
    pub fn with_string_array<S: AsRef<str>>(self, name: impl Into<String>, values: &[S]) -> Self {
        let rendered = values
            .iter()
            .map(|v| quote_string(v.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        self.push(name, format!("[{}]", rendered))
    }

    fn push(mut self, name: impl Into<String>, rendered: String) -> Self {
        self.params.push((name.into(), rendered));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

fn quote_string(value: &str) -> String {
    format!("'{}'", escape_text(value, true))
}

fn escape_text(value: &str, quoted: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\'' if quoted => out.push_str("\\'"),
            c => out.push(c),
        }
    }
    out
}

/// Per-query engine settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuerySettings {
    /// Ask the engine to reject data and schema modifications.
    pub readonly: bool,
}

impl QuerySettings {
    pub fn read_only() -> Self {
        Self { readonly: true }
    }
}

/// A client able to run SQL against the engine.
///
/// Implementations own connection handling: each call acquires whatever
/// session it needs and releases it before returning, on success or error.
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Run `query` and return its result set (empty for statements without one).
    async fn execute(
        &self,
        query: &str,
        params: &QueryParams,
        settings: &QuerySettings,
    ) -> Result<RawQueryResult, EngineFailure>;

    /// Check connectivity. Returns the engine version.
    async fn ping(&self) -> Result<String, EngineFailure>;
}
