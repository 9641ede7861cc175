//! [`RelayRunner`]: one run from reference text to updated issues.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use workflow::operations::{
    add_comments, apply_transitions, assign_issues, current_user, fetch_issues, find_resolution,
    find_user,
};
use workflow::{
    BatchEngine, BatchObserver, IssueScanner, IssueSnapshot, IssueTracker, RunId, ScanError,
    Timestamp, TracingObserver, TransitionOutcome,
};

use crate::error::RunError;
use crate::report::RunReport;
use crate::request::RelayRequest;

/// Drives the phases of a run against one tracker.
pub struct RelayRunner {
    tracker: Arc<dyn IssueTracker>,
    scanner: IssueScanner,
    observer: Arc<dyn BatchObserver>,
}

impl std::fmt::Debug for RelayRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayRunner").finish_non_exhaustive()
    }
}

impl RelayRunner {
    /// Creates a runner that logs per-issue results through `tracing`.
    pub fn new(tracker: Arc<dyn IssueTracker>) -> Self {
        Self::with_observer(tracker, Arc::new(TracingObserver))
    }

    pub fn with_observer(tracker: Arc<dyn IssueTracker>, observer: Arc<dyn BatchObserver>) -> Self {
        Self {
            tracker,
            scanner: IssueScanner::new(),
            observer,
        }
    }

    /// Executes one run.
    ///
    /// Phases run strictly in order: current user, assignee lookup, scan,
    /// fetch, resolution lookup, transitions, assignments, comments. The first
    /// fatal error stops the run. Per-issue failures during the fetch are
    /// logged and the issue dropped; in later batches any failure is fatal
    /// once the whole batch has finished.
    ///
    /// `request.timeout` bounds the whole run. When it expires, in-flight
    /// calls are abandoned and no further phase starts.
    ///
    /// # Errors
    ///
    /// See [`RunError`].
    pub async fn run(&self, request: &RelayRequest) -> Result<RunReport, RunError> {
        let run_id = RunId::new_random();
        let cancel = CancellationToken::new();
        let timer = tokio::spawn({
            let cancel = cancel.clone();
            let timeout = request.timeout;
            async move {
                tokio::time::sleep(timeout).await;
                warn!(timeout_secs = timeout.as_secs(), "Run deadline reached, cancelling");
                cancel.cancel();
            }
        });

        let span = info_span!("relay_run", run_id = %run_id);
        let result = self
            .run_phases(run_id, request, &cancel)
            .instrument(span)
            .await;
        timer.abort();
        result
    }

    async fn run_phases(
        &self,
        run_id: RunId,
        request: &RelayRequest,
        cancel: &CancellationToken,
    ) -> Result<RunReport, RunError> {
        let mut report = RunReport::started(run_id);
        let engine = BatchEngine::new(cancel.clone(), Arc::clone(&self.observer));
        let tracker = self.tracker.as_ref();

        let me = until_cancelled(cancel, current_user(tracker))
            .await?
            .map_err(RunError::CurrentUser)?;
        info!(
            username = %me.name,
            display_name = %me.display_name,
            email = %me.email,
            "User account"
        );

        let assignee = match &request.assignee {
            Some(name) => {
                let user = until_cancelled(cancel, find_user(tracker, name))
                    .await?
                    .map_err(RunError::Assignee)?;
                info!(
                    username = %user.name,
                    display_name = %user.display_name,
                    email = %user.email,
                    "Assignee account"
                );
                Some(user)
            }
            None => None,
        };

        let keys = self
            .scanner
            .extract(&request.reference, request.issue_pattern.as_deref())?;
        if keys.is_empty() {
            return Err(ScanError::NoIssueKeys.into());
        }
        info!(count = keys.len(), "Issue keys found in reference");
        report.keys_found = keys.clone();

        let (fetched, fetch_error) =
            fetch_issues(&engine, Arc::clone(&self.tracker), keys).await.into_parts();
        ensure_live(cancel)?;
        if let Some(error) = fetch_error {
            warn!(failed = error.failed, total = error.total, "Some issues could not be fetched");
            report.fetch_failures = error.failed;
        }
        if fetched.is_empty() {
            return Err(RunError::NoIssuesFound);
        }
        report.issues_fetched = fetched.len();
        let issues: Vec<Arc<IssueSnapshot>> = fetched.into_iter().map(Arc::new).collect();

        let resolution = match &request.resolution {
            Some(name) => {
                let found = until_cancelled(cancel, find_resolution(tracker, name))
                    .await?
                    .map_err(RunError::Resolution)?;
                if found.is_none() {
                    warn!(resolution = %name, "Resolution not found, transitioning without one");
                }
                found.map(|r| r.id)
            }
            None => None,
        };

        if let Some(target) = &request.transition {
            let outcomes = apply_transitions(
                &engine,
                Arc::clone(&self.tracker),
                &issues,
                target,
                resolution,
            )
            .await;
            ensure_live(cancel)?;
            let outcomes = outcomes.into_result().map_err(RunError::Transitions)?;
            for outcome in outcomes {
                match outcome {
                    TransitionOutcome::Applied { .. } => report.transitioned += 1,
                    TransitionOutcome::NotFound => report.transitions_skipped += 1,
                }
            }
        }

        if let Some(user) = &assignee {
            let assigned =
                assign_issues(&engine, Arc::clone(&self.tracker), &issues, &user.name).await;
            ensure_live(cancel)?;
            report.assigned = assigned.into_result().map_err(RunError::Assignments)?.len();
        }

        if let Some(comment) = &request.comment {
            let body = if request.markdown {
                markup::render_markdown(comment)
            } else {
                comment.clone()
            };
            let receipts = add_comments(
                &engine,
                Arc::clone(&self.tracker),
                &issues,
                &me.name,
                &body,
            )
            .await;
            ensure_live(cancel)?;
            report.commented = receipts.into_result().map_err(RunError::Comments)?.len();
        }

        report.finished_at = Timestamp::now();
        Ok(report)
    }
}

/// Awaits `future` unless the run is cancelled first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = T>,
) -> Result<T, RunError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(RunError::TimedOut),
        value = future => Ok(value),
    }
}

fn ensure_live(cancel: &CancellationToken) -> Result<(), RunError> {
    if cancel.is_cancelled() {
        Err(RunError::TimedOut)
    } else {
        Ok(())
    }
}
