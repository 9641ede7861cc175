//! Command-line flags and the settings resolved from them.
//!
//! Every setting can come from three places, checked in order: the flag, the
//! `INPUT_<KEY>` environment variable (as set by CI runners for action
//! inputs), then the plain `<KEY>` variable. Empty values count as unset.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use jira::{Credentials, JiraClientConfig};
use runner::{RelayRequest, DEFAULT_RUN_TIMEOUT};
use thiserror::Error;
use workflow::UserName;

/// Relay commit and pull-request activity to Jira issues.
#[derive(Debug, Default, Parser)]
#[command(name = "jira-relay", version, about)]
pub struct Cli {
    /// File of environment variables loaded before anything else.
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Emit log records as JSON.
    #[arg(long)]
    pub log_json: bool,

    /// Jira server root URL.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Skip TLS certificate verification.
    #[arg(long)]
    pub insecure: bool,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Personal access token, sent as a bearer token.
    #[arg(long)]
    pub token: Option<String>,

    /// Text to scan for issue keys.
    #[arg(long = "ref")]
    pub reference: Option<String>,

    /// Regular expression for issue keys, replacing the default.
    #[arg(long)]
    pub issue_format: Option<String>,

    /// Name of the transition to apply to every issue.
    #[arg(long)]
    pub transition: Option<String>,

    /// Resolution name sent with the transition.
    #[arg(long)]
    pub resolution: Option<String>,

    /// User name to assign every issue to.
    #[arg(long)]
    pub assignee: Option<String>,

    /// Comment added to every issue.
    #[arg(long)]
    pub comment: Option<String>,

    /// Convert the comment from Markdown to Jira wiki markup.
    #[arg(long)]
    pub markdown: bool,

    /// Log the resolved configuration and lower the log level to debug.
    #[arg(long)]
    pub debug: bool,

    /// Upper bound on the whole run, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Configuration that cannot start a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base_url is required")]
    MissingBaseUrl,

    #[error("ref is required")]
    MissingRef,

    #[error("authentication credentials required (username/password or token)")]
    MissingCredentials,

    #[error("password is required when username is provided")]
    MissingPassword,

    #[error("username is required when password is provided")]
    MissingUsername,

    #[error("timeout must be a positive number of seconds, got '{0}'")]
    InvalidTimeout(String),
}

/// Validated settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub insecure: bool,
    pub credentials: Credentials,
    pub reference: String,
    pub issue_format: Option<String>,
    pub transition: Option<String>,
    pub resolution: Option<String>,
    pub assignee: Option<UserName>,
    pub comment: Option<String>,
    pub markdown: bool,
    pub debug: bool,
    pub timeout: Duration,
}

impl Settings {
    /// Resolves settings from `cli` and the process environment.
    ///
    /// # Errors
    ///
    /// See [`Settings::resolve`].
    pub fn from_env(cli: &Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }

    /// Resolves settings from `cli`, falling back to `env` per key.
    ///
    /// # Errors
    ///
    /// A [`ConfigError`] naming the first rule broken: base URL, reference,
    /// credentials, then timeout.
    pub fn resolve(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |flag: &Option<String>, key: &str| value(flag.as_deref(), key, &env);

        let base_url = text(&cli.base_url, "base_url").ok_or(ConfigError::MissingBaseUrl)?;
        let reference = text(&cli.reference, "ref").ok_or(ConfigError::MissingRef)?;

        let username = text(&cli.username, "username");
        let password = text(&cli.password, "password");
        let token = text(&cli.token, "token");
        let credentials = match (username, password, token) {
            (Some(username), Some(password), _) => Credentials::Basic { username, password },
            (Some(_), None, _) => return Err(ConfigError::MissingPassword),
            (None, Some(_), _) => return Err(ConfigError::MissingUsername),
            (None, None, Some(token)) => Credentials::Bearer { token },
            (None, None, None) => return Err(ConfigError::MissingCredentials),
        };

        let timeout = match cli.timeout_secs {
            Some(0) => return Err(ConfigError::InvalidTimeout("0".to_string())),
            Some(secs) => Duration::from_secs(secs),
            None => match value(None, "timeout", &env) {
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => Duration::from_secs(secs),
                    _ => return Err(ConfigError::InvalidTimeout(raw)),
                },
                None => DEFAULT_RUN_TIMEOUT,
            },
        };

        Ok(Self {
            base_url,
            insecure: enabled(cli.insecure, "insecure", &env),
            credentials,
            reference,
            issue_format: text(&cli.issue_format, "issue_format"),
            transition: text(&cli.transition, "transition"),
            resolution: text(&cli.resolution, "resolution"),
            assignee: text(&cli.assignee, "assignee").and_then(UserName::new),
            comment: text(&cli.comment, "comment"),
            markdown: enabled(cli.markdown, "markdown", &env),
            debug: enabled(cli.debug, "debug", &env),
            timeout,
        })
    }

    pub fn client_config(&self) -> JiraClientConfig {
        JiraClientConfig {
            base_url: self.base_url.clone(),
            credentials: self.credentials.clone(),
            insecure: self.insecure,
        }
    }

    pub fn relay_request(&self) -> RelayRequest {
        RelayRequest {
            reference: self.reference.clone(),
            issue_pattern: self.issue_format.clone(),
            transition: self.transition.clone(),
            resolution: self.resolution.clone(),
            assignee: self.assignee.clone(),
            comment: self.comment.clone(),
            markdown: self.markdown,
            timeout: self.timeout,
        }
    }
}

/// Whether debug output was asked for, before full validation runs.
pub fn debug_requested(cli: &Cli) -> bool {
    enabled(cli.debug, "debug", &|key: &str| std::env::var(key).ok())
}

/// Flag, then `INPUT_<KEY>`, then `<KEY>`; empty strings are skipped.
fn value(flag: Option<&str>, key: &str, env: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let key = key.to_ascii_uppercase();
    flag.map(str::to_string)
        .into_iter()
        .chain(std::iter::once_with(|| env(&format!("INPUT_{key}"))).flatten())
        .chain(std::iter::once_with(|| env(&key)).flatten())
        .find(|v| !v.is_empty())
}

/// A switch is on when its flag is given or its value is `true` (any case)
/// or `1`.
fn enabled(flag: bool, key: &str, env: &impl Fn(&str) -> Option<String>) -> bool {
    flag || value(None, key, env).is_some_and(|v| parse_bool(&v))
}

fn parse_bool(raw: &str) -> bool {
    raw.eq_ignore_ascii_case("true") || raw == "1"
}
