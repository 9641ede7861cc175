//! Error taxonomy for the relay domain.
//!
//! [`OperationError`] is the per-item failure produced inside a batch; it
//! never escapes the batch except inside a [`BatchError`]. [`ScanError`] and
//! [`LookupError`] are produced outside batches and are usually fatal to the
//! run.
//!
//! A missing transition is deliberately absent from this module: it is a
//! successful [`crate::TransitionOutcome::NotFound`], not an error.

use thiserror::Error;

use crate::{IssueKey, StatusCode};

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

/// Errors produced while extracting issue keys from a reference string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// The reference contained no issue keys.
    ///
    /// The scanner itself returns an empty list; callers raise this when an
    /// empty list is fatal for them.
    #[error("no issue keys found in ref")]
    NoIssueKeys,

    /// A caller-supplied pattern failed to compile.
    #[error("invalid issue pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// Compiler diagnostic.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Per-item failures
// ---------------------------------------------------------------------------

/// Failure of one remote call for one issue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The request never produced a reply (connection, TLS, timeout, ...).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The tracker replied with a status other than the one success code for
    /// this call.
    #[error("unexpected status: {status}, body: {body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    /// The status matched but the body could not be decoded.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    /// The run's cancellation scope fired before the call finished.
    #[error("operation cancelled")]
    Cancelled,

    /// The task executing the operation panicked.
    #[error("task panicked: {message}")]
    TaskPanicked { message: String },
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// A single (non-batched) lookup failed.
///
/// "No match" is not a lookup error; lookups that can legitimately find
/// nothing return `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{what} lookup failed")]
pub struct LookupError {
    /// What was being looked up (`"current user"`, `"user 'bob'"`, ...).
    pub what: String,
    /// The underlying call failure.
    pub source: OperationError,
}

// ---------------------------------------------------------------------------
// Batch aggregate
// ---------------------------------------------------------------------------

/// One or more items of a batch failed.
///
/// The message carries only the count; individual failures were already
/// reported to the batch observer when they happened. `failures` is kept for
/// callers that need per-item detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("encountered {failed} errors while {operation}")]
pub struct BatchError {
    /// Progressive description of the batch, e.g. `"updating assignees"`.
    pub operation: &'static str,
    /// Number of failed items.
    pub failed: usize,
    /// Number of items submitted.
    pub total: usize,
    /// Failing keys with their errors, in completion order.
    pub failures: Vec<(IssueKey, OperationError)>,
}
