//! Newtype domain identifiers.
//!
//! Every tracker concept that has an identity is a distinct newtype wrapping a
//! primitive. This prevents passing a [`TransitionId`] where a
//! [`ResolutionId`] is expected even though the tracker sends both as strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Tracker-assigned identifiers
// ---------------------------------------------------------------------------

string_id! {
    /// An issue reference such as `ABC-123`.
    ///
    /// Produced by [`crate::IssueScanner`]. Equality is exact and
    /// case-sensitive; two keys are the same issue only if the strings match.
    IssueKey
}

string_id! {
    /// Opaque id of a workflow transition, only meaningful for the issue it
    /// was fetched with.
    TransitionId
}

string_id! {
    /// Opaque id of a resolution (closing reason such as "Fixed").
    ResolutionId
}

string_id! {
    /// A tracker account name, used for assignment and comment authorship.
    UserName
}

string_id! {
    /// Id the tracker assigns to a newly created comment.
    CommentId
}

// ---------------------------------------------------------------------------
// UUID-backed identifiers (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single relay run (one CLI invocation).
///
/// Attached to the run span so every log record from one run can be
/// correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
