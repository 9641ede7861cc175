//! [`JiraClient`]: the `reqwest` implementation of [`IssueTracker`].

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use workflow::{
    CommentReceipt, IssueKey, IssueSnapshot, IssueTracker, OperationError, Resolution,
    ResolutionId, StatusCode, TrackerReply, TransitionId, User, UserName,
};

use crate::error::ClientError;
use crate::wire::{
    resolutions_into_domain, AssigneeRequest, CommentRequest, JiraComment, JiraIssue, JiraNamed,
    JiraUser, TransitionRequest,
};

/// Path prefix of every REST v2 endpoint, relative to the base URL.
const API_PREFIX: [&str; 3] = ["rest", "api", "2"];

/// How requests authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP basic auth.
    Basic { username: String, password: String },
    /// `Authorization: Bearer <token>` (personal access token).
    Bearer { token: String },
    /// No `Authorization` header.
    Anonymous,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"<redacted>")
                .finish(),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Everything needed to build a [`JiraClient`].
#[derive(Debug, Clone)]
pub struct JiraClientConfig {
    /// Server root, e.g. `https://jira.example.com` (a context path is kept).
    pub base_url: String,
    pub credentials: Credentials,
    /// Accept any TLS certificate.
    pub insecure: bool,
}

/// Jira REST v2 client.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl JiraClient {
    /// Builds the HTTP client.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidBaseUrl`] when `base_url` does not parse or
    /// cannot carry a path; [`ClientError::Http`] when the TLS backend fails
    /// to initialise.
    pub fn new(config: JiraClientConfig) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|e| ClientError::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: e.to_string(),
            })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: config.base_url,
                message: "URL cannot carry a path".to_string(),
            });
        }

        if config.insecure {
            warn!("TLS certificate verification is disabled");
        }
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        Ok(Self {
            http,
            base_url,
            credentials: config.credentials,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, OperationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| OperationError::Transport {
                message: format!("base URL {} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.credentials {
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            Credentials::Bearer { token } => builder.bearer_auth(token),
            Credentials::Anonymous => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, OperationError> {
        let response = builder.send().await.map_err(transport)?;
        debug!(status = response.status().as_u16(), url = %response.url(), "Jira replied");
        Ok(response)
    }
}

fn transport(e: reqwest::Error) -> OperationError {
    OperationError::Transport {
        message: e.to_string(),
    }
}

/// Reads a reply whose 2xx body should decode as `W`.
///
/// Non-2xx replies, and 2xx bodies that fail to decode or convert, carry no
/// payload.
async fn read_json<W, T>(
    response: Response,
    convert: impl FnOnce(W) -> Option<T>,
) -> Result<TrackerReply<T>, OperationError>
where
    W: DeserializeOwned,
{
    let status = StatusCode::new(response.status().as_u16());
    let body = response.text().await.map_err(transport)?;
    let payload = if status.is_success() {
        match serde_json::from_str::<W>(&body) {
            Ok(wire) => convert(wire),
            Err(e) => {
                debug!(error = %e, "Reply body did not decode");
                None
            }
        }
    } else {
        None
    };
    Ok(TrackerReply {
        status,
        payload,
        body,
    })
}

/// Reads a reply that carries no meaningful body on success.
async fn read_empty(response: Response) -> Result<TrackerReply<()>, OperationError> {
    let status = StatusCode::new(response.status().as_u16());
    let body = response.text().await.map_err(transport)?;
    Ok(TrackerReply {
        status,
        payload: status.is_success().then_some(()),
        body,
    })
}

#[async_trait]
impl IssueTracker for JiraClient {
    #[instrument(skip_all)]
    async fn current_user(&self) -> Result<TrackerReply<User>, OperationError> {
        let url = self.endpoint(&["myself"])?;
        let response = self.send(self.request(Method::GET, url)).await?;
        read_json(response, JiraUser::into_domain).await
    }

    #[instrument(skip_all, fields(user = %name))]
    async fn user_by_name(&self, name: &UserName) -> Result<TrackerReply<User>, OperationError> {
        let url = self.endpoint(&["user"])?;
        let request = self
            .request(Method::GET, url)
            .query(&[("username", name.as_str())]);
        let response = self.send(request).await?;
        read_json(response, JiraUser::into_domain).await
    }

    #[instrument(skip_all)]
    async fn resolutions(&self) -> Result<TrackerReply<Vec<Resolution>>, OperationError> {
        let url = self.endpoint(&["resolution"])?;
        let response = self.send(self.request(Method::GET, url)).await?;
        read_json::<Vec<JiraNamed>, _>(response, resolutions_into_domain).await
    }

    #[instrument(skip_all, fields(issue = %key))]
    async fn issue_with_transitions(
        &self,
        key: &IssueKey,
    ) -> Result<TrackerReply<IssueSnapshot>, OperationError> {
        let url = self.endpoint(&["issue", key.as_str()])?;
        let request = self
            .request(Method::GET, url)
            .query(&[("expand", "transitions")]);
        let response = self.send(request).await?;
        read_json(response, JiraIssue::into_domain).await
    }

    #[instrument(skip_all, fields(issue = %key, transition = %transition))]
    async fn transition_issue(
        &self,
        key: &IssueKey,
        transition: &TransitionId,
        resolution: Option<&ResolutionId>,
    ) -> Result<TrackerReply<()>, OperationError> {
        let url = self.endpoint(&["issue", key.as_str(), "transitions"])?;
        let request = self
            .request(Method::POST, url)
            .json(&TransitionRequest::new(transition, resolution));
        let response = self.send(request).await?;
        read_empty(response).await
    }

    #[instrument(skip_all, fields(issue = %key, assignee = %assignee))]
    async fn assign_issue(
        &self,
        key: &IssueKey,
        assignee: &UserName,
    ) -> Result<TrackerReply<()>, OperationError> {
        let url = self.endpoint(&["issue", key.as_str(), "assignee"])?;
        let request = self.request(Method::PUT, url).json(&AssigneeRequest {
            name: assignee.as_str(),
        });
        let response = self.send(request).await?;
        read_empty(response).await
    }

    #[instrument(skip_all, fields(issue = %key, author = %author))]
    async fn add_comment(
        &self,
        key: &IssueKey,
        author: &UserName,
        body: &str,
    ) -> Result<TrackerReply<CommentReceipt>, OperationError> {
        let url = self.endpoint(&["issue", key.as_str(), "comment"])?;
        let request = self.request(Method::POST, url).json(&CommentRequest {
            name: author.as_str(),
            body,
        });
        let response = self.send(request).await?;
        read_json(response, |c: JiraComment| Some(c.into_domain())).await
    }
}
