//! Core domain for jira-relay.
//!
//! This crate holds every domain concept of the relay: newtype identifiers,
//! tracker value types, the error taxonomy, issue-key scanning, the concurrent
//! batch engine, and the four per-issue operations. Infrastructure crates
//! implement the [`IssueTracker`] port defined here; they never add domain
//! rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** No HTTP or file-system crates. It
//! defines *what* the relay asks of a tracker; the `jira` crate defines *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`IssueKey`, `TransitionId`, `RunId`, etc.) |
//! | [`types`] | Value types (`IssueSnapshot`, `User`, `TrackerReply`, etc.) |
//! | [`errors`] | `ScanError`, `OperationError`, `LookupError`, `BatchError` |
//! | [`scanner`] | `IssueScanner`: issue keys from free text |
//! | [`batch`] | `BatchEngine`: one task per item, aggregate outcome |
//! | [`observer`] | `BatchObserver`: per-item diagnostics |
//! | [`tracker`] | `IssueTracker` port |
//! | [`operations`] | fetch / transition / assign / comment, plus lookups |

pub mod batch;
pub mod errors;
pub mod identifiers;
pub mod observer;
pub mod operations;
pub mod scanner;
pub mod tracker;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use batch::{BatchEngine, BatchItem, BatchOutcome, BatchReport};
pub use errors::{BatchError, LookupError, OperationError, ScanError};
pub use identifiers::{CommentId, IssueKey, ResolutionId, RunId, TransitionId, UserName};
pub use observer::{BatchObserver, TracingObserver};
pub use scanner::{IssueScanner, DEFAULT_ISSUE_PATTERN};
pub use tracker::IssueTracker;
pub use types::{
    CommentReceipt, IssueSnapshot, Resolution, StatusCode, Timestamp, TrackerReply, Transition,
    TransitionOutcome, User,
};
