//! The issue-tracker port.
//!
//! [`IssueTracker`] is what the operations in [`crate::operations`] need from
//! the remote tracker. Infrastructure crates implement it; the domain never
//! sees HTTP types.
//!
//! Every method performs exactly one remote call and returns the raw
//! [`TrackerReply`]. Deciding whether the status means success is left to the
//! caller, because each operation has its own single success code.

use async_trait::async_trait;

use crate::errors::OperationError;
use crate::{
    CommentReceipt, IssueKey, IssueSnapshot, Resolution, ResolutionId, TrackerReply, TransitionId,
    User, UserName,
};

/// Remote operations consumed by the relay.
///
/// Implementations are shared across concurrent tasks and must be safe to call
/// from many of them at once.
///
/// `Err` is reserved for transport-level failures (no reply at all); any reply
/// the server sends, whatever its status, is an `Ok`.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// The authenticated account.
    async fn current_user(&self) -> Result<TrackerReply<User>, OperationError>;

    /// Looks up an account by user name.
    async fn user_by_name(&self, name: &UserName) -> Result<TrackerReply<User>, OperationError>;

    /// All resolutions, in server order.
    async fn resolutions(&self) -> Result<TrackerReply<Vec<Resolution>>, OperationError>;

    /// One issue, including its currently legal transitions.
    async fn issue_with_transitions(
        &self,
        key: &IssueKey,
    ) -> Result<TrackerReply<IssueSnapshot>, OperationError>;

    /// Applies a transition, optionally setting a resolution.
    async fn transition_issue(
        &self,
        key: &IssueKey,
        transition: &TransitionId,
        resolution: Option<&ResolutionId>,
    ) -> Result<TrackerReply<()>, OperationError>;

    /// Sets the issue's assignee.
    async fn assign_issue(
        &self,
        key: &IssueKey,
        assignee: &UserName,
    ) -> Result<TrackerReply<()>, OperationError>;

    /// Adds a comment authored by `author`.
    async fn add_comment(
        &self,
        key: &IssueKey,
        author: &UserName,
        body: &str,
    ) -> Result<TrackerReply<CommentReceipt>, OperationError>;
}
