//! Fatal run errors.
//!
//! Each variant names the phase that stopped the run. The wrapped error is
//! exposed as the `source`, never repeated in the message, so a caller
//! walking the chain prints every cause once.

use thiserror::Error;
use workflow::{BatchError, LookupError, ScanError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("error getting self")]
    CurrentUser(#[source] LookupError),

    #[error("error getting assignee")]
    Assignee(#[source] LookupError),

    #[error("error processing issues")]
    Scan(#[from] ScanError),

    #[error("no issues found")]
    NoIssuesFound,

    #[error("error getting resolution")]
    Resolution(#[source] LookupError),

    #[error("error processing transitions")]
    Transitions(#[source] BatchError),

    #[error("error processing assignee")]
    Assignments(#[source] BatchError),

    #[error("error adding comments")]
    Comments(#[source] BatchError),

    #[error("run timed out")]
    TimedOut,
}
