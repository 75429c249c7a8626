//! Write/drop access flags.
//!
//! These are the process-wide defaults. The policy crate turns them into an
//! `AccessPolicy` and decides whether the environment may override them per
//! request.

use serde::{Deserialize, Serialize};

/// Environment variable enabling write statements.
pub const ALLOW_WRITE_ACCESS_ENV: &str = "CLICKHOUSE_ALLOW_WRITE_ACCESS";

/// Environment variable enabling drop-class statements.
pub const ALLOW_DROP_ENV: &str = "CLICKHOUSE_ALLOW_DROP";

/// Configured access flags. Both default to disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Allow INSERT/CREATE/ALTER and other mutating statements.
    #[serde(default)]
    pub allow_write_access: bool,

    /// Allow DROP/TRUNCATE. Only meaningful when `allow_write_access` is set.
    #[serde(default)]
    pub allow_drop: bool,
}
