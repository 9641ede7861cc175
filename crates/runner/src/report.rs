//! Summary of a finished run.

use serde::Serialize;
use workflow::{IssueKey, RunId, Timestamp};

/// Counts of what one successful run did, logged as JSON by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
    /// Keys found in the reference, in first-seen order.
    pub keys_found: Vec<IssueKey>,
    pub issues_fetched: usize,
    /// Keys that could not be fetched and were left out of later phases.
    pub fetch_failures: usize,
    pub transitioned: usize,
    /// Issues with no transition of the requested name.
    pub transitions_skipped: usize,
    pub assigned: usize,
    pub commented: usize,
}

impl RunReport {
    pub(crate) fn started(run_id: RunId) -> Self {
        let now = Timestamp::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            keys_found: Vec::new(),
            issues_fetched: 0,
            fetch_failures: 0,
            transitioned: 0,
            transitions_skipped: 0,
            assigned: 0,
            commented: 0,
        }
    }
}
