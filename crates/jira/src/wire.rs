//! Jira REST v2 JSON shapes.
//!
//! Response types are lenient: everything except identity fields defaults
//! when absent. Conversion into domain types fails (returns `None`) only when
//! an identity field is empty.

use serde::{Deserialize, Serialize};
use workflow::{
    CommentId, CommentReceipt, IssueKey, IssueSnapshot, Resolution, ResolutionId, Transition,
    TransitionId, User, UserName,
};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JiraUser {
    #[serde(default)]
    name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email_address: String,
}

impl JiraUser {
    pub(crate) fn into_domain(self) -> Option<User> {
        Some(User {
            name: UserName::new(self.name)?,
            display_name: self.display_name,
            email: self.email_address,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct JiraNamed {
    id: String,
    #[serde(default)]
    name: String,
}

impl JiraNamed {
    fn into_transition(self) -> Option<Transition> {
        Some(Transition {
            id: TransitionId::new(self.id)?,
            name: self.name,
        })
    }

    fn into_resolution(self) -> Option<Resolution> {
        Some(Resolution {
            id: ResolutionId::new(self.id)?,
            name: self.name,
        })
    }
}

pub(crate) fn resolutions_into_domain(list: Vec<JiraNamed>) -> Option<Vec<Resolution>> {
    list.into_iter().map(JiraNamed::into_resolution).collect()
}

#[derive(Debug, Default, Deserialize)]
struct JiraStatus {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct JiraIssueFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    status: JiraStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JiraIssue {
    key: String,
    #[serde(default)]
    fields: JiraIssueFields,
    #[serde(default)]
    transitions: Vec<JiraNamed>,
}

impl JiraIssue {
    pub(crate) fn into_domain(self) -> Option<IssueSnapshot> {
        Some(IssueSnapshot {
            key: IssueKey::new(self.key)?,
            summary: self.fields.summary,
            status: self.fields.status.name,
            transitions: self
                .transitions
                .into_iter()
                .map(JiraNamed::into_transition)
                .collect::<Option<Vec<_>>>()?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct JiraComment {
    #[serde(default)]
    id: String,
    #[serde(default)]
    body: String,
}

impl JiraComment {
    pub(crate) fn into_domain(self) -> CommentReceipt {
        CommentReceipt {
            id: CommentId::new(self.id),
            body: self.body,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct IdRef<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct ResolutionField<'a> {
    resolution: IdRef<'a>,
}

/// Body of `POST /issue/{key}/transitions`.
#[derive(Debug, Serialize)]
pub(crate) struct TransitionRequest<'a> {
    transition: IdRef<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<ResolutionField<'a>>,
}

impl<'a> TransitionRequest<'a> {
    pub(crate) fn new(transition: &'a TransitionId, resolution: Option<&'a ResolutionId>) -> Self {
        Self {
            transition: IdRef {
                id: transition.as_str(),
            },
            fields: resolution.map(|r| ResolutionField {
                resolution: IdRef { id: r.as_str() },
            }),
        }
    }
}

/// Body of `PUT /issue/{key}/assignee`.
#[derive(Debug, Serialize)]
pub(crate) struct AssigneeRequest<'a> {
    pub(crate) name: &'a str,
}

/// Body of `POST /issue/{key}/comment`.
#[derive(Debug, Serialize)]
pub(crate) struct CommentRequest<'a> {
    pub(crate) name: &'a str,
    pub(crate) body: &'a str,
}
