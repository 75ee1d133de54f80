//! Token lookups for published reports.

use crate::error::Result;
use crate::token::TokenIssuer;
use crate::types::PublicReport;
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;
use vigil_db::{public_reports, Database};

/// Resolves access tokens to public reports.
pub struct ReportReader {
    db: Arc<Database>,
    issuer: Arc<dyn TokenIssuer>,
}

impl ReportReader {
    /// Create a reader. `issuer` must hash the same way as the publisher's.
    #[must_use]
    pub fn new(db: Arc<Database>, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self { db, issuer }
    }

    /// The report for `token`, if it exists and has not expired.
    ///
    /// Unknown, blank and expired tokens are indistinguishable to the caller.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<PublicReport>> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        let hash = self.issuer.hash(token);
        let Some(record) = public_reports::find_by_token_hash(self.db.pool(), &hash).await? else {
            return Ok(None);
        };

        if !record.is_live(Utc::now()) {
            return Ok(None);
        }

        match serde_json::from_str(&record.report_json) {
            Ok(report) => Ok(Some(report)),
            Err(e) => {
                warn!(run_id = %record.run_id, error = %e, "stored public report is unreadable");
                Ok(None)
            }
        }
    }
}
