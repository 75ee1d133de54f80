//! Queue commands: enqueue, process one, inspect.

use super::print_json;
use crate::cli::{EnqueueArgs, StatusArgs};
use crate::state::AppState;
use anyhow::{bail, Result};
use serde::Serialize;
use std::io::Write;
use tracing::debug;
use vigil_audit::{ProcessedRun, RunOutcome};
use vigil_core::{RunId, RunStatus};

/// Output of `enqueue`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueuedView {
    pub run_id: String,
    pub target_id: String,
    pub normalized_url: String,
    pub status: RunStatus,
}

/// Output of `once`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedView {
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Option<ProcessedRun>> for ProcessedView {
    fn from(processed: Option<ProcessedRun>) -> Self {
        let Some(processed) = processed else {
            return Self {
                processed: false,
                run_id: None,
                outcome: None,
                public_token: None,
                error: None,
            };
        };

        let (outcome, public_token, error) = match processed.outcome {
            RunOutcome::Completed { public_token } => ("completed", public_token, None),
            RunOutcome::Failed(message) => ("failed", None, Some(message)),
            RunOutcome::NotFound => ("notFound", None, None),
        };

        Self {
            processed: true,
            run_id: Some(processed.run_id.to_string()),
            outcome: Some(outcome),
            public_token,
            error,
        }
    }
}

/// Queue an audit, optionally processing the queue once right away.
pub async fn enqueue(state: &AppState, args: &EnqueueArgs, out: &mut impl Write) -> Result<()> {
    let (target, run) = state.service.create_audit(&args.url).await?;

    print_json(
        out,
        &EnqueuedView {
            run_id: run.id.to_string(),
            target_id: target.id.to_string(),
            normalized_url: target.normalized_url,
            status: run.status,
        },
    )?;

    if args.now {
        once(state, out).await?;
    }
    Ok(())
}

/// Process at most one queued run.
pub async fn once(state: &AppState, out: &mut impl Write) -> Result<()> {
    let processed = state.service.process_next_queued_run().await?;
    if processed.is_none() {
        debug!("No queued audit run found");
    }
    print_json(out, &ProcessedView::from(processed))
}

/// Print the state of a run.
pub async fn status(state: &AppState, args: &StatusArgs, out: &mut impl Write) -> Result<()> {
    let run_id = RunId::new(args.run_id.trim())?;

    match state.service.get_run_status(&run_id).await? {
        Some(view) => print_json(out, &view),
        None => bail!("run {run_id} not found"),
    }
}
