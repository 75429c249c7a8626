//! Where the access policy comes from at request time.
//!
//! The gateway asks its provider for the current policy exactly once per
//! request and uses that value for the whole decision.

use crate::gate::AccessPolicy;
use clickgate_core::config::{ALLOW_DROP_ENV, ALLOW_WRITE_ACCESS_ENV, parse_bool};
use std::sync::Arc;

/// Supplies the policy in force for a request.
pub trait PolicyProvider: Send + Sync {
    fn current(&self) -> AccessPolicy;
}

/// A fixed policy.
impl PolicyProvider for AccessPolicy {
    fn current(&self) -> AccessPolicy {
        *self
    }
}

impl<T: PolicyProvider + ?Sized> PolicyProvider for Arc<T> {
    fn current(&self) -> AccessPolicy {
        (**self).current()
    }
}

/// Re-reads `CLICKHOUSE_ALLOW_WRITE_ACCESS` / `CLICKHOUSE_ALLOW_DROP` on every
/// request, so a change to the environment applies to the next call.
///
/// Unset variables fall back to the configured defaults. A malformed value
/// counts as `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvPolicy {
    defaults: AccessPolicy,
}

impl EnvPolicy {
    pub fn new(defaults: AccessPolicy) -> Self {
        Self { defaults }
    }

    /// Resolve the policy through an arbitrary variable lookup.
    pub fn resolve<F>(&self, lookup: F) -> AccessPolicy
    where
        F: Fn(&str) -> Option<String>,
    {
        AccessPolicy {
            write_allowed: flag(&lookup, ALLOW_WRITE_ACCESS_ENV, self.defaults.write_allowed),
            drop_allowed: flag(&lookup, ALLOW_DROP_ENV, self.defaults.drop_allowed),
        }
    }
}

impl PolicyProvider for EnvPolicy {
    fn current(&self) -> AccessPolicy {
        self.resolve(|key| std::env::var(key).ok())
    }
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => match parse_bool(key, &value) {
            Ok(flag) => flag,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed access flag, treating as disabled");
                false
            }
        },
        _ => default,
    }
}
