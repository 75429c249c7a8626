//! Access policy gate.
//!
//! The gate is a pure function of a statement kind and a policy value. It
//! never talks to the engine: a denial here means the query was never sent.

use crate::statement::StatementKind;
use clickgate_core::config::{ALLOW_DROP_ENV, ALLOW_WRITE_ACCESS_ENV, AccessConfig};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Write/drop flags in force for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub write_allowed: bool,
    pub drop_allowed: bool,
}

impl AccessPolicy {
    /// The default policy: reads only.
    pub fn read_only() -> Self {
        Self::default()
    }

    /// Writes allowed, drops still blocked.
    pub fn read_write() -> Self {
        Self {
            write_allowed: true,
            drop_allowed: false,
        }
    }

    /// Everything allowed.
    pub fn unrestricted() -> Self {
        Self {
            write_allowed: true,
            drop_allowed: true,
        }
    }
}

impl From<AccessConfig> for AccessPolicy {
    fn from(config: AccessConfig) -> Self {
        Self {
            write_allowed: config.allow_write_access,
            drop_allowed: config.allow_drop,
        }
    }
}

/// Why the gate rejected a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Denial {
    /// Write access is disabled; `kind` is the statement that was blocked.
    WriteDisabled { kind: StatementKind },
    /// Writes are enabled but drop-class statements are not.
    DropDisabled,
}

impl Denial {
    /// Stable tag for programmatic handling.
    pub fn category(&self) -> &'static str {
        match self {
            Denial::WriteDisabled { .. } => "write_disabled",
            Denial::DropDisabled => "drop_disabled",
        }
    }

    /// The setting that would lift this denial.
    pub fn required_flag(&self) -> &'static str {
        match self {
            Denial::WriteDisabled { .. } => ALLOW_WRITE_ACCESS_ENV,
            Denial::DropDisabled => ALLOW_DROP_ENV,
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::WriteDisabled { kind } => {
                write!(
                    f,
                    "Write operations are not allowed: write access is disabled. \
                     Set {}=true to enable write queries.",
                    ALLOW_WRITE_ACCESS_ENV
                )?;
                if *kind == StatementKind::Drop {
                    write!(
                        f,
                        " DROP operations additionally require {}=true.",
                        ALLOW_DROP_ENV
                    )?;
                }
                Ok(())
            }
            Denial::DropDisabled => write!(
                f,
                "DROP operations are not allowed. Set {}=true to enable destructive operations.",
                ALLOW_DROP_ENV
            ),
        }
    }
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

/// Decide whether a statement of `kind` may run under `policy`.
pub fn authorize(kind: StatementKind, policy: AccessPolicy) -> Decision {
    match kind {
        StatementKind::Read => Decision::Allowed,
        StatementKind::Write | StatementKind::Drop if !policy.write_allowed => {
            Decision::Denied(Denial::WriteDisabled { kind })
        }
        StatementKind::Drop if !policy.drop_allowed => Decision::Denied(Denial::DropDisabled),
        StatementKind::Write | StatementKind::Drop => Decision::Allowed,
    }
}
