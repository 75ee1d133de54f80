//! Entry points used by the worker: enqueue, process one, inspect.

use crate::error::{AuditError, Result};
use crate::orchestrator::{AuditOrchestrator, RunOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use vigil_core::{extract_hostname, normalize_url, RunId, RunStatus, TargetId};
use vigil_db::{runs, targets, AuditRun, Database, Target};

/// Externally visible state of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusView {
    /// Run id
    pub run_id: RunId,
    /// Audited target
    pub target_id: TargetId,
    /// Lifecycle state
    pub status: RunStatus,
    /// When the run was queued
    pub created_at: DateTime<Utc>,
    /// When a worker claimed it
    pub started_at: Option<DateTime<Utc>>,
    /// When it reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
    /// Failure message
    pub last_error: Option<String>,
    /// Whether a report is stored
    pub has_result: bool,
}

impl From<AuditRun> for RunStatusView {
    fn from(run: AuditRun) -> Self {
        Self {
            run_id: run.id,
            target_id: run.target_id,
            status: run.status,
            created_at: run.created_at,
            started_at: run.started_at,
            finished_at: run.finished_at,
            last_error: run.last_error,
            has_result: run.result_json.is_some(),
        }
    }
}

/// A run this worker claimed and drove to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRun {
    /// The run
    pub run_id: RunId,
    /// How it ended
    pub outcome: RunOutcome,
}

/// Queue front-end over the orchestrator.
pub struct AuditService {
    db: Arc<Database>,
    orchestrator: Arc<AuditOrchestrator>,
}

impl AuditService {
    /// Create a new audit service.
    #[must_use]
    pub fn new(db: Arc<Database>, orchestrator: Arc<AuditOrchestrator>) -> Self {
        Self { db, orchestrator }
    }

    /// Queue an audit of `input_url`.
    ///
    /// The target is looked up by normalized URL first, so re-auditing the
    /// same page adds a run to the existing target.
    ///
    /// # Errors
    /// Returns `AuditError::Normalization` if the URL is not auditable.
    pub async fn create_audit(&self, input_url: &str) -> Result<(Target, AuditRun)> {
        let normalized = normalize_url(input_url).map_err(|e| AuditError::Normalization(e.to_string()))?;
        let hostname =
            extract_hostname(&normalized).map_err(|e| AuditError::Normalization(e.to_string()))?;

        let pool = self.db.pool();
        let target = targets::find_or_create_target(pool, input_url.trim(), &normalized, &hostname).await?;
        let run = runs::create_queued_run(pool, &target.id).await?;

        info!(
            run_id = %run.id,
            target_id = %target.id,
            url = %target.normalized_url,
            "audit queued"
        );

        Ok((target, run))
    }

    /// Claim the oldest queued run and process it.
    ///
    /// Returns `None` when the queue is empty or another worker won the
    /// claim.
    pub async fn process_next_queued_run(&self) -> Result<Option<ProcessedRun>> {
        let pool = self.db.pool();

        let Some(run) = runs::find_next_queued(pool).await? else {
            return Ok(None);
        };

        let token = Uuid::new_v4().simple().to_string();
        if !runs::claim_run(pool, &run.id, &token, Utc::now()).await? {
            debug!(run_id = %run.id, "claim lost to another worker");
            return Ok(None);
        }

        let outcome = self.orchestrator.process_run(&run.id, &token).await?;
        Ok(Some(ProcessedRun {
            run_id: run.id,
            outcome,
        }))
    }

    /// Current state of a run.
    pub async fn get_run_status(&self, run_id: &RunId) -> Result<Option<RunStatusView>> {
        Ok(runs::get_run(self.db.pool(), run_id)
            .await?
            .map(RunStatusView::from))
    }
}
