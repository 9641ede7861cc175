//! The four per-issue operations, plus the single lookups a run needs.
//!
//! Each batch operation performs one [`IssueTracker`] call per issue through
//! the [`BatchEngine`], accepts exactly one status code as success, and
//! reports successes and skips to the engine's observer. Failures are
//! reported by the engine itself.

use std::sync::Arc;

use crate::batch::{BatchEngine, BatchReport};
use crate::errors::{LookupError, OperationError};
use crate::tracker::IssueTracker;
use crate::types::first_named;
use crate::{
    CommentReceipt, IssueKey, IssueSnapshot, Resolution, ResolutionId, StatusCode, TrackerReply,
    TransitionOutcome, User, UserName,
};

/// Batch description for [`fetch_issues`].
pub const FETCHING_ISSUES: &str = "getting issues";
/// Batch description for [`apply_transitions`].
pub const PROCESSING_TRANSITIONS: &str = "processing transitions";
/// Batch description for [`assign_issues`].
pub const UPDATING_ASSIGNEES: &str = "updating assignees";
/// Batch description for [`add_comments`].
pub const ADDING_COMMENTS: &str = "adding comments";

// ---------------------------------------------------------------------------
// Batch operations
// ---------------------------------------------------------------------------

/// Fetches every key together with its legal transitions.
///
/// Keys that fail are reported and left out of the successes; callers
/// normally carry on with whatever was fetched.
pub async fn fetch_issues(
    engine: &BatchEngine,
    tracker: Arc<dyn IssueTracker>,
    keys: Vec<IssueKey>,
) -> BatchReport<IssueSnapshot> {
    let observer = Arc::clone(engine.observer());
    engine
        .run(FETCHING_ISSUES, keys, move |key: IssueKey| {
            let tracker = Arc::clone(&tracker);
            let observer = Arc::clone(&observer);
            async move {
                let issue = tracker
                    .issue_with_transitions(&key)
                    .await?
                    .expect(StatusCode::OK)?;
                observer.succeeded(
                    FETCHING_ISSUES,
                    &key,
                    &format!("status '{}': {}", issue.status, issue.summary),
                );
                Ok(issue)
            }
        })
        .await
}

/// Moves each issue along the transition named `target`.
///
/// An issue with no legal transition of that name is skipped with a warning
/// and counts as a success ([`TransitionOutcome::NotFound`]); no remote call
/// is made for it.
pub async fn apply_transitions(
    engine: &BatchEngine,
    tracker: Arc<dyn IssueTracker>,
    issues: &[Arc<IssueSnapshot>],
    target: &str,
    resolution: Option<ResolutionId>,
) -> BatchReport<TransitionOutcome> {
    let observer = Arc::clone(engine.observer());
    let target: Arc<str> = Arc::from(target);
    engine
        .run(
            PROCESSING_TRANSITIONS,
            issues.to_vec(),
            move |issue: Arc<IssueSnapshot>| {
                let tracker = Arc::clone(&tracker);
                let observer = Arc::clone(&observer);
                let target = Arc::clone(&target);
                let resolution = resolution.clone();
                async move {
                    let Some(transition) = issue.transition_named(&target).cloned() else {
                        observer.skipped(
                            PROCESSING_TRANSITIONS,
                            &issue.key,
                            &format!("transition '{target}' not found for issue"),
                        );
                        return Ok(TransitionOutcome::NotFound);
                    };

                    tracker
                        .transition_issue(&issue.key, &transition.id, resolution.as_ref())
                        .await?
                        .expect(StatusCode::NO_CONTENT)?;
                    observer.succeeded(
                        PROCESSING_TRANSITIONS,
                        &issue.key,
                        &format!(
                            "moved from '{}' via '{}': {}",
                            issue.status, transition.name, issue.summary
                        ),
                    );
                    Ok(TransitionOutcome::Applied { transition })
                }
            },
        )
        .await
}

/// Sets `assignee` on every issue.
pub async fn assign_issues(
    engine: &BatchEngine,
    tracker: Arc<dyn IssueTracker>,
    issues: &[Arc<IssueSnapshot>],
    assignee: &UserName,
) -> BatchReport<()> {
    let observer = Arc::clone(engine.observer());
    let assignee = assignee.clone();
    engine
        .run(
            UPDATING_ASSIGNEES,
            issues.to_vec(),
            move |issue: Arc<IssueSnapshot>| {
                let tracker = Arc::clone(&tracker);
                let observer = Arc::clone(&observer);
                let assignee = assignee.clone();
                async move {
                    tracker
                        .assign_issue(&issue.key, &assignee)
                        .await?
                        .expect(StatusCode::NO_CONTENT)?;
                    observer.succeeded(
                        UPDATING_ASSIGNEES,
                        &issue.key,
                        &format!("assignee set to {assignee}"),
                    );
                    Ok(())
                }
            },
        )
        .await
}

/// Adds the same comment, authored by `author`, to every issue.
///
/// `body` is sent as-is; Markdown conversion happens before this call.
pub async fn add_comments(
    engine: &BatchEngine,
    tracker: Arc<dyn IssueTracker>,
    issues: &[Arc<IssueSnapshot>],
    author: &UserName,
    body: &str,
) -> BatchReport<CommentReceipt> {
    let observer = Arc::clone(engine.observer());
    let author = author.clone();
    let body: Arc<str> = Arc::from(body);
    engine
        .run(
            ADDING_COMMENTS,
            issues.to_vec(),
            move |issue: Arc<IssueSnapshot>| {
                let tracker = Arc::clone(&tracker);
                let observer = Arc::clone(&observer);
                let author = author.clone();
                let body = Arc::clone(&body);
                async move {
                    let receipt = tracker
                        .add_comment(&issue.key, &author, &body)
                        .await?
                        .expect(StatusCode::CREATED)?;
                    observer.succeeded(ADDING_COMMENTS, &issue.key, &receipt.body);
                    Ok(receipt)
                }
            },
        )
        .await
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

fn lookup<T>(
    what: impl Into<String>,
    reply: Result<TrackerReply<T>, OperationError>,
) -> Result<T, LookupError> {
    reply
        .and_then(|reply| reply.expect(StatusCode::OK))
        .map_err(|source| LookupError {
            what: what.into(),
            source,
        })
}

/// The account the relay is authenticated as; comments are authored by it.
///
/// # Errors
///
/// [`LookupError`] on a transport failure or any status other than 200.
pub async fn current_user(tracker: &dyn IssueTracker) -> Result<User, LookupError> {
    lookup("current user", tracker.current_user().await)
}

/// Resolves an assignee name to an account.
///
/// # Errors
///
/// [`LookupError`] on a transport failure or any status other than 200
/// (including 404 for an unknown user).
pub async fn find_user(tracker: &dyn IssueTracker, name: &UserName) -> Result<User, LookupError> {
    lookup(format!("user '{name}'"), tracker.user_by_name(name).await)
}

/// Finds the resolution called `name` (case-insensitive, first match
/// in server order).
///
/// `Ok(None)` when no resolution has that name.
///
/// # Errors
///
/// [`LookupError`] when the resolution list itself could not be fetched.
pub async fn find_resolution(
    tracker: &dyn IssueTracker,
    name: &str,
) -> Result<Option<Resolution>, LookupError> {
    let resolutions = lookup("resolution list", tracker.resolutions().await)?;
    Ok(first_named(&resolutions, name, |r| r.name.as_str()).cloned())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::observer::recording::RecordingObserver;
    use crate::{CommentId, Transition, TransitionId};

    /// In-memory tracker: every call succeeds with the documented status
    /// unless a per-key status override says otherwise.
    #[derive(Default)]
    struct FakeTracker {
        overrides: HashMap<String, u16>,
        transport_failures: Vec<String>,
        resolutions: Vec<(&'static str, &'static str)>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTracker {
        fn with_status(mut self, key: &str, status: u16) -> Self {
            self.overrides.insert(key.to_string(), status);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn reply<T>(
            &self,
            call: String,
            key: &str,
            success: StatusCode,
            payload: T,
        ) -> Result<TrackerReply<T>, OperationError> {
            self.calls.lock().unwrap().push(call);
            if self.transport_failures.iter().any(|k| k == key) {
                return Err(OperationError::Transport {
                    message: "connection reset".into(),
                });
            }
            match self.overrides.get(key) {
                Some(status) => Ok(TrackerReply::without_payload(
                    StatusCode::new(*status),
                    "{\"errorMessages\":[\"nope\"]}",
                )),
                None => Ok(TrackerReply::with_payload(success, payload)),
            }
        }
    }

    fn user(name: &str) -> User {
        User {
            name: UserName::new(name).unwrap(),
            display_name: name.to_uppercase(),
            email: format!("{name}@example.com"),
        }
    }

    fn snapshot(key: &str, transitions: &[(&str, &str)]) -> Arc<IssueSnapshot> {
        Arc::new(IssueSnapshot {
            key: IssueKey::new(key).unwrap(),
            summary: format!("Test issue {key}"),
            status: "Open".into(),
            transitions: transitions
                .iter()
                .map(|(id, name)| Transition {
                    id: TransitionId::new(*id).unwrap(),
                    name: name.to_string(),
                })
                .collect(),
        })
    }

    #[async_trait]
    impl IssueTracker for FakeTracker {
        async fn current_user(&self) -> Result<TrackerReply<User>, OperationError> {
            self.reply("myself".into(), "myself", StatusCode::OK, user("bot"))
        }

        async fn user_by_name(
            &self,
            name: &UserName,
        ) -> Result<TrackerReply<User>, OperationError> {
            let found = user(name.as_str());
            self.reply(format!("user {name}"), name.as_str(), StatusCode::OK, found)
        }

        async fn resolutions(&self) -> Result<TrackerReply<Vec<Resolution>>, OperationError> {
            let list = self
                .resolutions
                .iter()
                .map(|(id, name)| Resolution {
                    id: ResolutionId::new(*id).unwrap(),
                    name: name.to_string(),
                })
                .collect();
            self.reply("resolutions".into(), "resolutions", StatusCode::OK, list)
        }

        async fn issue_with_transitions(
            &self,
            key: &IssueKey,
        ) -> Result<TrackerReply<IssueSnapshot>, OperationError> {
            let issue = snapshot(key.as_str(), &[("31", "Done")]);
            self.reply(format!("get {key}"), key.as_str(), StatusCode::OK, (*issue).clone())
        }

        async fn transition_issue(
            &self,
            key: &IssueKey,
            transition: &TransitionId,
            resolution: Option<&ResolutionId>,
        ) -> Result<TrackerReply<()>, OperationError> {
            let resolution = resolution.map(ResolutionId::as_str).unwrap_or("-");
            let call = format!("transition {key} {transition} {resolution}");
            self.reply(call, key.as_str(), StatusCode::NO_CONTENT, ())
        }

        async fn assign_issue(
            &self,
            key: &IssueKey,
            assignee: &UserName,
        ) -> Result<TrackerReply<()>, OperationError> {
            self.reply(format!("assign {key} {assignee}"), key.as_str(), StatusCode::NO_CONTENT, ())
        }

        async fn add_comment(
            &self,
            key: &IssueKey,
            author: &UserName,
            body: &str,
        ) -> Result<TrackerReply<CommentReceipt>, OperationError> {
            let receipt = CommentReceipt {
                id: CommentId::new("10000"),
                body: body.to_string(),
            };
            let call = format!("comment {key} {author}");
            self.reply(call, key.as_str(), StatusCode::CREATED, receipt)
        }
    }

    fn engine(observer: Arc<RecordingObserver>) -> BatchEngine {
        BatchEngine::new(CancellationToken::new(), observer)
    }

    fn keys(names: &[&str]) -> Vec<IssueKey> {
        names.iter().map(|n| IssueKey::new(*n).unwrap()).collect()
    }

    #[tokio::test]
    async fn fetch_drops_failed_keys() {
        let tracker = Arc::new(FakeTracker::default().with_status("DEF-456", 404));
        let report =
            fetch_issues(&engine(Arc::default()), tracker, keys(&["ABC-123", "DEF-456"])).await;

        let (issues, error) = report.into_parts();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key.as_str(), "ABC-123");
        assert_eq!(issues[0].transitions[0].name, "Done");
        let error = error.unwrap();
        assert_eq!(error.failed, 1);
        assert_eq!(error.failures[0].0.as_str(), "DEF-456");
        assert!(matches!(
            error.failures[0].1,
            OperationError::UnexpectedStatus { status, .. } if status.as_u16() == 404
        ));
    }

    #[tokio::test]
    async fn fetch_transport_failure_is_an_item_failure() {
        let tracker = Arc::new(FakeTracker {
            transport_failures: vec!["ABC-1".into()],
            ..FakeTracker::default()
        });
        let report =
            fetch_issues(&engine(Arc::default()), tracker, keys(&["ABC-1", "ABC-2"])).await;
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.succeeded_count(), 1);
    }

    #[tokio::test]
    async fn transition_matches_name_case_insensitively_and_sends_resolution() {
        let tracker = Arc::new(FakeTracker::default());
        let issues = vec![snapshot("ABC-1", &[("11", "In Progress"), ("31", "Done")])];
        let report = apply_transitions(
            &engine(Arc::default()),
            tracker.clone(),
            &issues,
            "done",
            ResolutionId::new("1"),
        )
        .await;

        let outcomes = report.into_result().unwrap();
        assert!(matches!(
            &outcomes[0],
            TransitionOutcome::Applied { transition } if transition.id.as_str() == "31"
        ));
        assert_eq!(tracker.calls(), vec!["transition ABC-1 31 1"]);
    }

    #[tokio::test]
    async fn missing_transition_is_a_skip_not_a_failure() {
        let observer = Arc::new(RecordingObserver::default());
        let tracker = Arc::new(FakeTracker::default());
        let issues = vec![
            snapshot("ABC-1", &[("11", "In Progress")]),
            snapshot("ABC-2", &[("31", "Done")]),
        ];
        let report =
            apply_transitions(&engine(observer.clone()), tracker.clone(), &issues, "Done", None)
                .await;

        let (outcomes, error) = report.into_parts();
        assert!(error.is_none());
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.contains(&TransitionOutcome::NotFound));
        assert_eq!(observer.kinds_for("ABC-1"), vec!["skipped"]);
        assert_eq!(observer.kinds_for("ABC-2"), vec!["succeeded"]);
        assert_eq!(tracker.calls(), vec!["transition ABC-2 31 -"]);
    }

    #[tokio::test]
    async fn transition_requires_no_content() {
        let tracker = Arc::new(FakeTracker::default().with_status("ABC-1", 400));
        let issues = vec![snapshot("ABC-1", &[("31", "Done")])];
        let error = apply_transitions(&engine(Arc::default()), tracker, &issues, "Done", None)
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(error.to_string(), "encountered 1 errors while processing transitions");
    }

    #[tokio::test]
    async fn assign_reports_each_issue() {
        let observer = Arc::new(RecordingObserver::default());
        let tracker = Arc::new(FakeTracker::default().with_status("ABC-2", 403));
        let issues = vec![snapshot("ABC-1", &[]), snapshot("ABC-2", &[])];
        let assignee = UserName::new("jdoe").unwrap();
        let report =
            assign_issues(&engine(observer.clone()), tracker.clone(), &issues, &assignee).await;

        assert_eq!(report.succeeded_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(observer.kinds_for("ABC-1"), vec!["succeeded"]);
        assert_eq!(observer.kinds_for("ABC-2"), vec!["failed"]);
        let mut calls = tracker.calls();
        calls.sort();
        assert_eq!(calls, vec!["assign ABC-1 jdoe", "assign ABC-2 jdoe"]);
    }

    #[tokio::test]
    async fn comment_requires_created() {
        let tracker = Arc::new(FakeTracker::default());
        let issues = vec![snapshot("ABC-1", &[])];
        let author = UserName::new("bot").unwrap();
        let batch = engine(Arc::default());
        let receipts = add_comments(&batch, tracker.clone(), &issues, &author, "h1. Done")
            .await
            .into_result()
            .unwrap();
        assert_eq!(receipts[0].body, "h1. Done");
        assert_eq!(tracker.calls(), vec!["comment ABC-1 bot"]);

        let failing = Arc::new(FakeTracker::default().with_status("ABC-1", 200));
        let error = add_comments(&engine(Arc::default()), failing, &issues, &author, "x")
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(error.failed, 1);
    }

    #[tokio::test]
    async fn lookups_classify_status() {
        let tracker = FakeTracker::default().with_status("ghost", 404);
        assert_eq!(current_user(&tracker).await.unwrap().name.as_str(), "bot");
        let err = find_user(&tracker, &UserName::new("ghost").unwrap()).await.unwrap_err();
        assert_eq!(err.what, "user 'ghost'");
        assert!(matches!(
            err.source,
            OperationError::UnexpectedStatus { status, .. } if status.as_u16() == 404
        ));
    }

    #[tokio::test]
    async fn resolution_lookup_returns_first_case_insensitive_match() {
        let tracker = FakeTracker {
            resolutions: vec![("1", "Fixed"), ("2", "Done"), ("3", "FIXED")],
            ..FakeTracker::default()
        };
        let found = find_resolution(&tracker, "fixed").await.unwrap().unwrap();
        assert_eq!(found.id.as_str(), "1");
        assert!(find_resolution(&tracker, "Won't Do").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resolution_lookup_matches_localised_names() {
        let tracker = FakeTracker {
            resolutions: vec![("1", "Erledigt"), ("2", "Исправлено")],
            ..FakeTracker::default()
        };
        let found = find_resolution(&tracker, "ИСПРАВЛЕНО").await.unwrap().unwrap();
        assert_eq!(found.id.as_str(), "2");
    }

    #[tokio::test]
    async fn resolution_list_failure_is_a_lookup_error() {
        let tracker = FakeTracker::default().with_status("resolutions", 500);
        assert!(find_resolution(&tracker, "Fixed").await.is_err());
    }
}
