//! Error taxonomy for gateway operations.

use crate::adapter::EngineFailure;
use clickgate_policy::Denial;

/// Everything a gateway operation can fail with.
///
/// All variants reach callers as one tool error; `category()` tells them
/// apart without parsing the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Rejected locally by the access policy. The engine was not contacted.
    #[error("{reason}")]
    PolicyDenied { reason: Denial },

    /// The engine rejected or failed the query.
    #[error("Query execution failed: {detail}")]
    QueryExecutionFailed { detail: String },

    /// Listing databases or tables failed at the engine.
    #[error("Introspection failed: {detail}")]
    IntrospectionFailed { detail: String },

    /// The caller's arguments were unusable (bad page token, page size, ...).
    #[error("Invalid argument: {detail}")]
    InvalidArgument { detail: String },
}

impl GatewayError {
    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        GatewayError::InvalidArgument {
            detail: detail.into(),
        }
    }

    pub fn query_failed(failure: EngineFailure) -> Self {
        GatewayError::QueryExecutionFailed {
            detail: failure.message,
        }
    }

    pub fn introspection_failed(failure: EngineFailure) -> Self {
        GatewayError::IntrospectionFailed {
            detail: failure.message,
        }
    }

    /// Stable snake_case tag.
    pub fn category(&self) -> &'static str {
        match self {
            GatewayError::PolicyDenied { .. } => "policy_denied",
            GatewayError::QueryExecutionFailed { .. } => "query_execution_failed",
            GatewayError::IntrospectionFailed { .. } => "introspection_failed",
            GatewayError::InvalidArgument { .. } => "invalid_argument",
        }
    }

    /// True when the gateway itself refused the call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            GatewayError::PolicyDenied { .. } | GatewayError::InvalidArgument { .. }
        )
    }
}
