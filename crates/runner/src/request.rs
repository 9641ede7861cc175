//! What one run should do.

use std::time::Duration;

use workflow::UserName;

/// Upper bound on a whole run unless the caller picks another.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);

/// The validated inputs of one run.
///
/// Every optional action is skipped when its field is `None`.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    /// Free text to scan for issue keys (a commit message, branch name, PR title).
    pub reference: String,
    /// Custom key pattern; the default pattern is used when `None`.
    pub issue_pattern: Option<String>,
    /// Name of the transition to apply.
    pub transition: Option<String>,
    /// Name of the resolution to send with the transition.
    pub resolution: Option<String>,
    pub assignee: Option<UserName>,
    pub comment: Option<String>,
    /// Render `comment` from Markdown into wiki markup first.
    pub markdown: bool,
    pub timeout: Duration,
}

impl RelayRequest {
    /// A request that only scans `reference` and fetches the issues it names.
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            issue_pattern: None,
            transition: None,
            resolution: None,
            assignee: None,
            comment: None,
            markdown: false,
            timeout: DEFAULT_RUN_TIMEOUT,
        }
    }
}
