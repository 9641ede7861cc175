//! Jira infrastructure adapter for jira-relay.
//!
//! Implements the [`workflow::IssueTracker`] port over the Jira REST API v2
//! using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. It never
//! decides whether a status code means success; it reports the status, the
//! raw body and (when the body decodes) the payload, and the operations in
//! the [`workflow`] crate classify the reply.
//!
//! | Module     | Purpose                                                  |
//! |------------|----------------------------------------------------------|
//! | [`client`] | [`JiraClient`], authentication and endpoint construction |
//! | `wire`     | JSON request and response bodies                          |
//! | [`error`]  | Client construction errors                               |

pub mod client;
pub mod error;
mod wire;

pub use client::{Credentials, JiraClient, JiraClientConfig};
pub use error::ClientError;
