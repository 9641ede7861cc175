//! jira-relay entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration**: parse flags, load the env file, resolve and
//!    validate [`config::Settings`].
//! 2. **Wire observability**: install the `tracing` subscriber (see
//!    [`telemetry`]).
//! 3. **Construct infrastructure**: build the [`jira::JiraClient`] and inject
//!    it into a [`runner::RelayRunner`].
//! 4. **Run once** and map the outcome to the exit code.

mod config;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use jira::JiraClient;
use runner::RelayRunner;
use tracing::{error, info, warn};

use crate::config::{Cli, Settings};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Loaded before tracing so the env file can set RUST_LOG.
    let env_file = dotenvy::from_path(&cli.env_file);

    let telemetry = match telemetry::init(cli.log_json, config::debug_requested(&cli)) {
        Ok(telemetry) => telemetry,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    match env_file {
        Ok(()) => info!(path = %cli.env_file.display(), "Loaded env file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(path = %cli.env_file.display(), error = %e, "Ignoring unreadable env file"),
    }

    let code = match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "execution failed");
            ExitCode::FAILURE
        }
    };
    telemetry.shutdown();
    code
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::from_env(cli).context("invalid configuration")?;
    if settings.debug {
        info!(
            reference = %settings.reference,
            issue_pattern = ?settings.issue_format,
            transition = ?settings.transition,
            resolution = ?settings.resolution,
            comment = ?settings.comment,
            assignee = ?settings.assignee,
            credentials = ?settings.credentials,
            timeout_secs = settings.timeout.as_secs(),
            "Resolved configuration"
        );
    }

    let client = JiraClient::new(settings.client_config()).context("error creating jira client")?;
    let runner = RelayRunner::new(Arc::new(client));
    let report = runner.run(&settings.relay_request()).await?;

    info!(
        run_id = %report.run_id,
        report = %serde_json::to_string(&report)?,
        "Run finished"
    );
    Ok(())
}
