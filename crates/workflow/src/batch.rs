//! Concurrent batch execution with partial-failure semantics.
//!
//! [`BatchEngine::run`] spawns one task per item (no pool cap; batches are
//! sized by the number of keys in one CI event), funnels outcomes through a
//! channel sized to the batch, waits for every task, and reduces the outcomes
//! to a [`BatchReport`].
//!
//! One failing item never stops the others. The only thing that stops tasks
//! early is the engine's [`CancellationToken`], which belongs to the whole
//! run rather than to any single batch.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::{BatchError, OperationError};
use crate::observer::BatchObserver;
use crate::{IssueKey, IssueSnapshot};

// ---------------------------------------------------------------------------
// Items and outcomes
// ---------------------------------------------------------------------------

/// Anything a batch can run over: it must name the issue it concerns.
pub trait BatchItem: Send + 'static {
    fn key(&self) -> &IssueKey;
}

impl BatchItem for IssueKey {
    fn key(&self) -> &IssueKey {
        self
    }
}

impl BatchItem for Arc<IssueSnapshot> {
    fn key(&self) -> &IssueKey {
        &self.key
    }
}

/// Result of one item. Never modified after the task produces it.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    pub key: IssueKey,
    pub result: Result<T, OperationError>,
}

/// Every outcome of one batch, in completion order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport<T> {
    operation: &'static str,
    total: usize,
    outcomes: Vec<BatchOutcome<T>>,
}

impl<T> BatchReport<T> {
    /// Description of the batch, e.g. `"processing transitions"`.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Number of items submitted.
    pub fn total(&self) -> usize {
        self.total
    }

    /// All outcomes, in the order tasks finished.
    pub fn outcomes(&self) -> &[BatchOutcome<T>] {
        &self.outcomes
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn succeeded_count(&self) -> usize {
        self.total - self.failed_count()
    }

    /// Reduces the report to the successes and, if anything failed, a
    /// [`BatchError`] naming how many items failed.
    ///
    /// Successes are returned even when the error is present.
    pub fn into_parts(self) -> (Vec<T>, Option<BatchError>) {
        let mut successes = Vec::with_capacity(self.outcomes.len());
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome.result {
                Ok(value) => successes.push(value),
                Err(error) => failures.push((outcome.key, error)),
            }
        }
        let error = (!failures.is_empty()).then(|| BatchError {
            operation: self.operation,
            failed: failures.len(),
            total: self.total,
            failures,
        });
        (successes, error)
    }

    /// Like [`BatchReport::into_parts`], but any failure makes the whole
    /// batch an error.
    ///
    /// # Errors
    ///
    /// [`BatchError`] if at least one item failed.
    pub fn into_result(self) -> Result<Vec<T>, BatchError> {
        match self.into_parts() {
            (successes, None) => Ok(successes),
            (_, Some(error)) => Err(error),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Runs per-issue operations concurrently.
///
/// Cheap to clone; clones share the cancellation token and observer.
#[derive(Clone)]
pub struct BatchEngine {
    cancel: CancellationToken,
    observer: Arc<dyn BatchObserver>,
}

impl std::fmt::Debug for BatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchEngine")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl BatchEngine {
    /// Creates an engine whose tasks stop when `cancel` fires and whose
    /// per-item diagnostics go to `observer`.
    pub fn new(cancel: CancellationToken, observer: Arc<dyn BatchObserver>) -> Self {
        Self { cancel, observer }
    }

    /// The observer operations should report successes and skips to.
    pub fn observer(&self) -> &Arc<dyn BatchObserver> {
        &self.observer
    }

    /// Runs `op` once per item, concurrently, and waits for all of them.
    ///
    /// Failures (including cancellation and panics) are reported to the
    /// observer as they happen. An empty `items` returns at once without
    /// spawning anything.
    pub async fn run<I, R, F, Fut>(
        &self,
        operation: &'static str,
        items: Vec<I>,
        op: F,
    ) -> BatchReport<R>
    where
        I: BatchItem,
        R: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, OperationError>> + Send + 'static,
    {
        let total = items.len();
        if total == 0 {
            return BatchReport {
                operation,
                total,
                outcomes: Vec::new(),
            };
        }
        debug!(operation, total, "batch started");

        let op = Arc::new(op);
        let keys: Vec<IssueKey> = items.iter().map(|item| item.key().clone()).collect();
        let (tx, mut rx) = mpsc::channel::<(usize, BatchOutcome<R>)>(total);

        for (index, item) in items.into_iter().enumerate() {
            let tx = tx.clone();
            let op = Arc::clone(&op);
            let cancel = self.cancel.clone();
            let observer = Arc::clone(&self.observer);
            let key = keys[index].clone();
            tokio::spawn(async move {
                // An item that finished its remote call keeps its result even
                // if the scope fires on the same wake-up.
                let result = if cancel.is_cancelled() {
                    Err(OperationError::Cancelled)
                } else {
                    tokio::select! {
                        biased;
                        result = op(item) => result,
                        () = cancel.cancelled() => Err(OperationError::Cancelled),
                    }
                };
                if let Err(error) = &result {
                    observer.failed(operation, &key, error);
                }
                // Capacity equals the batch size, so this never waits. It only
                // fails if the engine future was dropped, and then nobody is
                // listening anyway.
                let _ = tx.send((index, BatchOutcome { key, result })).await;
            });
        }
        drop(tx);

        let mut reported = vec![false; total];
        let mut outcomes = Vec::with_capacity(total);
        while let Some((index, outcome)) = rx.recv().await {
            reported[index] = true;
            outcomes.push(outcome);
        }

        // A task that panicked dropped its sender without reporting.
        for (index, key) in keys.into_iter().enumerate() {
            if !reported[index] {
                let error = OperationError::TaskPanicked {
                    message: format!("task for {key} ended without reporting"),
                };
                self.observer.failed(operation, &key, &error);
                outcomes.push(BatchOutcome {
                    key,
                    result: Err(error),
                });
            }
        }

        let report = BatchReport {
            operation,
            total,
            outcomes,
        };
        debug!(
            operation,
            total,
            failed = report.failed_count(),
            "batch finished"
        );
        report
    }
}
