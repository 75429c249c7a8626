//! Query gateway: classify, authorize, execute, normalize.

use crate::adapter::{EngineClient, QueryParams, QuerySettings, RawQueryResult};
use crate::error::GatewayError;
use clickgate_core::QueryResult;
use clickgate_policy::{Decision, PolicyProvider, StatementClassifier, authorize};
use std::sync::Arc;
use std::time::Instant;

/// Runs caller-supplied SQL behind the access policy.
#[derive(Clone)]
pub struct QueryGateway {
    engine: Arc<dyn EngineClient>,
    policy: Arc<dyn PolicyProvider>,
    classifier: StatementClassifier,
}

impl QueryGateway {
    pub fn new(engine: Arc<dyn EngineClient>, policy: Arc<dyn PolicyProvider>) -> Self {
        Self {
            engine,
            policy,
            classifier: StatementClassifier::new(),
        }
    }

    /// Run one query.
    ///
    /// The policy is read once, before anything is awaited, and that value
    /// decides both the gate and the engine-side read-only setting.
    pub async fn run_query(&self, query: &str) -> Result<QueryResult, GatewayError> {
        let kind = self.classifier.classify(query);
        let policy = self.policy.current();

        if let Decision::Denied(reason) = authorize(kind, policy) {
            tracing::warn!(
                query_kind = %kind,
                denial = reason.category(),
                "Query rejected by access policy"
            );
            return Err(GatewayError::PolicyDenied { reason });
        }

        let settings = QuerySettings {
            readonly: !policy.write_allowed,
        };

        tracing::debug!(query_kind = %kind, query = %query, "Executing query");
        let started = Instant::now();

        let raw = self
            .engine
            .execute(query, &QueryParams::new(), &settings)
            .await
            .map_err(|failure| {
                tracing::warn!(
                    query_kind = %kind,
                    code = ?failure.code,
                    error = %failure.message,
                    "Query execution failed"
                );
                GatewayError::query_failed(failure)
            })?;

        let result = normalize(raw)?;

        tracing::info!(
            query_kind = %kind,
            columns = result.columns().len(),
            rows = result.rows().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query executed"
        );

        Ok(result)
    }
}

/// Turn an engine result into a `QueryResult`, refusing ragged rows rather
/// than returning a partial row set.
fn normalize(raw: RawQueryResult) -> Result<QueryResult, GatewayError> {
    let width = raw.columns.len();
    if let Some(index) = raw.rows.iter().position(|row| row.len() != width) {
        return Err(GatewayError::QueryExecutionFailed {
            detail: format!(
                "engine returned row {} with {} values for {} columns",
                index,
                raw.rows[index].len(),
                width
            ),
        });
    }

    Ok(QueryResult::new(raw.columns, raw.rows, raw.row_count))
}
