//! clickgate policy enforcement
//!
//! Two pieces decide whether a query may reach ClickHouse:
//!
//! - [`StatementClassifier`] looks at the leading keyword of each statement and
//!   tags the query as [`StatementKind::Read`], [`StatementKind::Write`] or
//!   [`StatementKind::Drop`].
//! - [`authorize`] checks that kind against an [`AccessPolicy`] and returns a
//!   [`Decision`]. Denials carry the remediation text shown to callers.
//!
//! | kind  | write off | write on, drop off | write on, drop on |
//! |-------|-----------|--------------------|-------------------|
//! | Read  | allow     | allow              | allow             |
//! | Write | deny      | allow              | allow             |
//! | Drop  | deny      | deny               | allow             |
//!
//! Policies are plain values. Where they come from at request time is the job
//! of a [`PolicyProvider`].

pub mod gate;
pub mod provider;
pub mod statement;

pub use gate::{AccessPolicy, Decision, Denial, authorize};
pub use provider::{EnvPolicy, PolicyProvider};
pub use statement::{StatementClassifier, StatementKind, classify};
