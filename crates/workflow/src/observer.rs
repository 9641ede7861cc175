//! Per-item diagnostics for batch runs.
//!
//! Batch tasks report each completion to a [`BatchObserver`] instead of
//! logging directly, so the engine can be exercised in tests without
//! capturing global output. [`TracingObserver`] is the production
//! implementation.

use tracing::{error, info, warn};

use crate::errors::OperationError;
use crate::IssueKey;

/// Receives one call per finished batch item.
///
/// Calls arrive concurrently from many tasks and must not block.
pub trait BatchObserver: Send + Sync {
    /// `operation` finished successfully for `key`; `detail` is a short
    /// human-readable description of what changed.
    fn succeeded(&self, operation: &'static str, key: &IssueKey, detail: &str);

    /// `operation` was skipped for `key` without being a failure.
    fn skipped(&self, operation: &'static str, key: &IssueKey, reason: &str);

    /// `operation` failed for `key`.
    fn failed(&self, operation: &'static str, key: &IssueKey, error: &OperationError);
}

/// Emits a `tracing` event per item.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn succeeded(&self, operation: &'static str, key: &IssueKey, detail: &str) {
        info!(operation, issue = %key, detail, "issue processed");
    }

    fn skipped(&self, operation: &'static str, key: &IssueKey, reason: &str) {
        warn!(operation, issue = %key, reason, "issue skipped");
    }

    fn failed(&self, operation: &'static str, key: &IssueKey, error: &OperationError) {
        error!(operation, issue = %key, error = %error, "issue failed");
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Mutex;

    use super::*;

    /// Observer that records every call, for assertions in tests.
    #[derive(Debug, Default)]
    pub struct RecordingObserver {
        pub events: Mutex<Vec<(String, String, String)>>,
    }

    impl RecordingObserver {
        pub fn kinds_for(&self, key: &str) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, k, _)| k == key)
                .map(|(kind, _, _)| kind.clone())
                .collect()
        }

        fn push(&self, kind: &str, key: &IssueKey, text: String) {
            self.events
                .lock()
                .unwrap()
                .push((kind.to_string(), key.to_string(), text));
        }
    }

    impl BatchObserver for RecordingObserver {
        fn succeeded(&self, _operation: &'static str, key: &IssueKey, detail: &str) {
            self.push("succeeded", key, detail.to_string());
        }

        fn skipped(&self, _operation: &'static str, key: &IssueKey, reason: &str) {
            self.push("skipped", key, reason.to_string());
        }

        fn failed(&self, _operation: &'static str, key: &IssueKey, error: &OperationError) {
            self.push("failed", key, error.to_string());
        }
    }
}
