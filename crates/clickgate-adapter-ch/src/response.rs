//! Decoding of `JSONCompact` response bodies.

use clickgate_runtime::{EngineFailure, RawQueryResult};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct CompactResponse {
    #[serde(default)]
    meta: Vec<ColumnMeta>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
    #[serde(default)]
    rows: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ColumnMeta {
    name: String,
    #[serde(rename = "type")]
    column_type: String,
}

/// Parse a successful response body. Statements without a result set
/// (DDL, INSERT) come back with an empty body.
pub(crate) fn parse_body(body: &str) -> Result<RawQueryResult, EngineFailure> {
    if body.trim().is_empty() {
        return Ok(RawQueryResult::default());
    }

    let response: CompactResponse = serde_json::from_str(body).map_err(|e| {
        // An exception raised after the header was sent is appended as text.
        match exception_text(body) {
            Some(text) => EngineFailure::new(text),
            None => EngineFailure::new(format!("Unreadable response from ClickHouse: {}", e)),
        }
    })?;

    let (columns, types) = response
        .meta
        .into_iter()
        .map(|m| (m.name, m.column_type))
        .unzip();

    Ok(RawQueryResult {
        columns,
        types,
        row_count: response.rows.or(Some(response.data.len() as u64)),
        rows: response.data,
    })
}

/// Build the failure for a non-2xx response.
pub(crate) fn failure(status: u16, exception_code: Option<&str>, body: &str) -> EngineFailure {
    let message = match body.trim() {
        "" => format!("ClickHouse returned HTTP {} with no message", status),
        text => text.to_string(),
    };

    let failure = EngineFailure::new(message);
    match exception_code.and_then(|c| c.trim().parse().ok()) {
        Some(code) => failure.with_code(code),
        None => failure,
    }
}

fn exception_text(body: &str) -> Option<&str> {
    body.find("Code: ").map(|start| body[start..].trim())
}
