//! jira-relay run orchestration.
//!
//! [`RelayRunner`] sequences one run: look up the acting account and the
//! assignee, scan the reference for issue keys, fetch the issues, then apply
//! the transition, assignment and comment batches that were requested.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The runner sequences calls between business logic
//! in the [`workflow`] crate and the [`workflow::IssueTracker`] port. It
//! contains no domain rules of its own and never talks HTTP directly.

mod error;
mod report;
mod request;
mod runner;

pub use error::RunError;
pub use report::RunReport;
pub use request::{RelayRequest, DEFAULT_RUN_TIMEOUT};
pub use runner::RelayRunner;
