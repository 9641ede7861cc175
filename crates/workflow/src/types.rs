//! Shared value types for the relay domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! tracker data (issue snapshots, users, replies) that the operations in
//! [`crate::operations`] consume and produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::OperationError;
use crate::{CommentId, IssueKey, ResolutionId, TransitionId, UserName};

// ---------------------------------------------------------------------------
// Workflow metadata
// ---------------------------------------------------------------------------

/// A legal workflow transition for one issue, as returned with
/// `expand=transitions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Opaque id passed back to the tracker when applying the transition.
    pub id: TransitionId,
    /// Display name (e.g. `"Done"`), matched case-insensitively.
    pub name: String,
}

/// A tracker-defined closing reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Opaque id sent along with a transition.
    pub id: ResolutionId,
    /// Display name (e.g. `"Fixed"`).
    pub name: String,
}

/// Returns the first entry whose name equals `name`, ignoring case.
///
/// Case is folded per character with Unicode lowercase mapping, so localised
/// names (`Закрыть`, `Étape`) match as well as ASCII ones.
///
/// Duplicate names resolve to whichever the tracker listed first.
pub(crate) fn first_named<'a, T>(
    entries: &'a [T],
    name: &str,
    name_of: impl Fn(&T) -> &str,
) -> Option<&'a T> {
    entries
        .iter()
        .find(|entry| eq_ignore_case(name_of(entry), name))
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// A remote issue as seen at fetch time.
///
/// Read-only once fetched; shared between mutation tasks behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSnapshot {
    /// Issue key, e.g. `ABC-123`.
    pub key: IssueKey,
    /// One-line summary.
    pub summary: String,
    /// Name of the current workflow status.
    pub status: String,
    /// Transitions currently legal from `status`, in server order.
    pub transitions: Vec<Transition>,
}

impl IssueSnapshot {
    /// Finds the legal transition named `name` (case-insensitive).
    pub fn transition_named(&self, name: &str) -> Option<&Transition> {
        first_named(&self.transitions, name, |t| t.name.as_str())
    }
}

/// Result of applying a transition to one issue.
///
/// [`TransitionOutcome::NotFound`] is a successful outcome: the issue simply
/// has no legal transition with the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum TransitionOutcome {
    /// The issue was moved along `transition`.
    Applied { transition: Transition },
    /// No matching transition; the issue was left untouched.
    NotFound,
}

// ---------------------------------------------------------------------------
// Users and comments
// ---------------------------------------------------------------------------

/// A tracker account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: UserName,
    pub display_name: String,
    pub email: String,
}

/// What the tracker echoes back after creating a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentReceipt {
    pub id: Option<CommentId>,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// HTTP status code of a tracker reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const CREATED: Self = Self(201);
    pub const NO_CONTENT: Self = Self(204);

    /// Creates a [`StatusCode`] from a raw integer.
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the underlying integer value.
    pub fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns `true` for any 2xx code.
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One reply from the tracker, before classification.
///
/// The adapter fills `payload` only when the body decoded as `T`; the raw
/// body text is kept for diagnostics either way.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerReply<T> {
    pub status: StatusCode,
    pub payload: Option<T>,
    pub body: String,
}

impl<T> TrackerReply<T> {
    /// Creates a reply with a decoded payload.
    pub fn with_payload(status: StatusCode, payload: T) -> Self {
        Self {
            status,
            payload: Some(payload),
            body: String::new(),
        }
    }

    /// Creates a reply whose body did not decode (or was not expected to).
    pub fn without_payload(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            payload: None,
            body: body.into(),
        }
    }

    /// Checks the status against the single success code for this call and
    /// returns the payload.
    ///
    /// # Errors
    ///
    /// [`OperationError::UnexpectedStatus`] when the status differs from
    /// `expected`; [`OperationError::MalformedResponse`] when it matches but
    /// no payload was decoded.
    pub fn expect(self, expected: StatusCode) -> Result<T, OperationError> {
        if self.status != expected {
            return Err(OperationError::UnexpectedStatus {
                status: self.status,
                body: self.body,
            });
        }
        self.payload.ok_or_else(|| OperationError::MalformedResponse {
            message: format!("status {} carried no decodable body", self.status),
        })
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
