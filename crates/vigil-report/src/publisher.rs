//! One public report per completed run.

use crate::composer::compose;
use crate::error::Result;
use crate::token::TokenIssuer;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use vigil_core::{Report, RunId};
use vigil_db::{public_reports, Database, PublicReportRecord, Target};

/// Result of a publication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new report was stored. The token is returned exactly once.
    Published {
        /// Plaintext access token
        token: String,
    },
    /// The run already has a public report; no new token was issued.
    AlreadyPublished,
}

/// Stores redacted reports addressed by a token hash.
pub struct ReportPublisher {
    db: Arc<Database>,
    issuer: Arc<dyn TokenIssuer>,
    ttl_days: Option<u32>,
}

impl ReportPublisher {
    /// Create a publisher whose reports never expire.
    #[must_use]
    pub fn new(db: Arc<Database>, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self {
            db,
            issuer,
            ttl_days: None,
        }
    }

    /// Expire reports `ttl_days` after publication.
    #[must_use]
    pub fn with_ttl_days(mut self, ttl_days: Option<u32>) -> Self {
        self.ttl_days = ttl_days;
        self
    }

    /// Publish `report` for `run_id` unless the run already has one.
    ///
    /// Concurrent callers for the same run race on the unique `run_id`
    /// constraint; the loser gets `AlreadyPublished` and its token is
    /// discarded without ever being returned.
    pub async fn publish_if_absent(
        &self,
        run_id: &RunId,
        target: &Target,
        report: &Report,
    ) -> Result<PublishOutcome> {
        let pool = self.db.pool();

        if public_reports::find_by_run_id(pool, run_id).await?.is_some() {
            return Ok(PublishOutcome::AlreadyPublished);
        }

        let public = compose(report);
        let report_json = serde_json::to_string(&public)?;

        let token = self.issuer.issue();
        let now = Utc::now();
        let record = PublicReportRecord {
            id: Uuid::new_v4().to_string(),
            target_id: target.id.clone(),
            run_id: run_id.clone(),
            token_hash: self.issuer.hash(&token),
            domain: (!public.domain.is_empty()).then(|| public.domain.clone()),
            target_url: target.normalized_url.clone(),
            report_json,
            created_at: now,
            expires_at: self.ttl_days.map(|days| now + Duration::days(i64::from(days))),
        };

        if public_reports::insert_if_absent(pool, &record).await? {
            debug!(run_id = %run_id, issues = public.issues.len(), "public report stored");
            Ok(PublishOutcome::Published { token })
        } else {
            Ok(PublishOutcome::AlreadyPublished)
        }
    }
}
