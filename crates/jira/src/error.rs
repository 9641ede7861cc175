//! Errors raised while building a [`crate::JiraClient`].
//!
//! Per-call failures are reported as [`workflow::OperationError`]; only
//! construction has its own error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
