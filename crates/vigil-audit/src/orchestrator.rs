//! Audit orchestrator driving one run through the pipeline.
//!
//! This module provides the `AuditOrchestrator` which sequences
//! fetch → analyze → enrich → aggregate → persist → publish for a claimed
//! run and guarantees that the run ends `COMPLETED` or `FAILED`.

use crate::analyzers::ContentAnalyzer;
use crate::context::AuditContext;
use crate::error::{AuditError, Result};
use crate::fetcher::PageFetcher;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use vigil_core::{normalize_url, Report, ReportMeta, RunId, GENERATOR, REPORT_SCHEMA_VERSION};
use vigil_db::{runs, targets, AuditRun, Database, Target};
use vigil_report::{mask_token, PublishOutcome, ReportPublisher};
use vigil_scoring::{aggregate, enrich_modules, ScorePolicy};

/// What happened to a run handed to [`AuditOrchestrator::process_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run no longer exists; nothing was done
    NotFound,
    /// Report stored. Carries the public token when one was issued by this call.
    Completed { public_token: Option<String> },
    /// The run failed with this message
    Failed(String),
}

/// Runs the audit pipeline for claimed runs.
pub struct AuditOrchestrator {
    /// Database holding runs and targets
    db: Arc<Database>,
    /// Page fetcher
    fetcher: Arc<dyn PageFetcher>,
    /// Analyzers in report order
    analyzers: Vec<Arc<dyn ContentAnalyzer>>,
    /// Scoring policy
    policy: Arc<dyn ScorePolicy>,
    /// Public report publisher, if publication is enabled
    publisher: Option<Arc<ReportPublisher>>,
}

impl AuditOrchestrator {
    /// Create an orchestrator without publication.
    #[must_use]
    pub fn new(
        db: Arc<Database>,
        fetcher: Arc<dyn PageFetcher>,
        analyzers: Vec<Arc<dyn ContentAnalyzer>>,
        policy: Arc<dyn ScorePolicy>,
    ) -> Self {
        Self {
            db,
            fetcher,
            analyzers,
            policy,
            publisher: None,
        }
    }

    /// Publish a public report after each completed run.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<ReportPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Process a run the caller has claimed under `claim_token`.
    ///
    /// Pipeline errors never escape: they fail the run and are returned as
    /// [`RunOutcome::Failed`]. An `Err` means the terminal state itself could
    /// not be written.
    pub async fn process_run(&self, run_id: &RunId, claim_token: &str) -> Result<RunOutcome> {
        let pool = self.db.pool();

        let Some(run) = runs::get_run(pool, run_id).await? else {
            warn!(run_id = %run_id, "run not found, skipping");
            return Ok(RunOutcome::NotFound);
        };

        info!(run_id = %run.id, target_id = %run.target_id, "processing audit run");

        match self.execute(&run, claim_token).await {
            Ok((target, report)) => {
                info!(
                    run_id = %run.id,
                    score = report.score.global.score,
                    max_score = report.score.global.max_score,
                    "audit run completed"
                );
                let public_token = self.publish(&run.id, &target, &report).await;
                Ok(RunOutcome::Completed { public_token })
            }
            Err(e) => {
                let message = e.to_string();
                error!(run_id = %run.id, error = %message, "audit run failed");
                runs::fail_run(pool, &run.id, claim_token, &message, Utc::now()).await?;
                Ok(RunOutcome::Failed(message))
            }
        }
    }

    /// Steps 2-8. Returns the target and the stored report.
    async fn execute(&self, run: &AuditRun, claim_token: &str) -> Result<(Target, Report)> {
        let pool = self.db.pool();

        let target = targets::get_target(pool, &run.target_id)
            .await?
            .ok_or_else(|| AuditError::TargetNotFound {
                run_id: run.id.to_string(),
                target_id: run.target_id.to_string(),
            })?;

        let normalized_url = if target.normalized_url.trim().is_empty() {
            normalize_url(&target.input_url).map_err(|e| AuditError::Normalization(e.to_string()))?
        } else {
            target.normalized_url.clone()
        };

        let ctx = AuditContext::new(run.id.clone(), &target.input_url, &normalized_url);

        let fetch = self.fetcher.fetch(ctx.normalized_url()).await?;
        let http_status_code = (fetch.status_code != 0).then_some(fetch.status_code);
        let ctx = ctx.with_fetch(fetch);

        let modules: Vec<_> = self
            .analyzers
            .iter()
            .map(|analyzer| {
                debug!(run_id = %run.id, module = analyzer.module_id(), "running analyzer");
                analyzer.analyze(&ctx)
            })
            .collect();

        let modules = enrich_modules(self.policy.as_ref(), &modules);
        let score = aggregate(self.policy.version(), &modules);

        let report = Report {
            schema_version: REPORT_SCHEMA_VERSION,
            input_url: target.input_url.clone(),
            normalized_url,
            generated_at: Utc::now(),
            meta: ReportMeta {
                generator: GENERATOR.to_string(),
                schema_version: REPORT_SCHEMA_VERSION,
                scoring_version: self.policy.version(),
                run_id: run.id.to_string(),
                http_status_code,
            },
            modules,
            score,
        };

        let json = report.to_json()?;
        runs::complete_run(pool, &run.id, claim_token, &json, Utc::now()).await?;

        Ok((target, report))
    }

    /// Best-effort publication. Failures are logged and swallowed.
    async fn publish(&self, run_id: &RunId, target: &Target, report: &Report) -> Option<String> {
        let publisher = self.publisher.as_ref()?;

        match publisher.publish_if_absent(run_id, target, report).await {
            Ok(PublishOutcome::Published { token }) => {
                info!(run_id = %run_id, token = %mask_token(&token), "public report published");
                Some(token)
            }
            Ok(PublishOutcome::AlreadyPublished) => {
                debug!(run_id = %run_id, "public report already published");
                None
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "public report publication failed");
                None
            }
        }
    }
}
