//! Public report storage.
//!
//! Stores the redacted report JSON next to the SHA-256 of its access token.
//! The plaintext token is never persisted.

use crate::error::{DatabaseError, Result};
use crate::{from_db_timestamp, from_db_timestamp_opt, to_db_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use vigil_core::{RunId, TargetId};

/// A published, token-addressed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicReportRecord {
    /// Unique identifier
    pub id: String,
    /// Audited target
    pub target_id: TargetId,
    /// Run the report was built from (one report per run)
    pub run_id: RunId,
    /// Hex SHA-256 of the access token
    pub token_hash: String,
    /// Host of the audited URL
    pub domain: Option<String>,
    /// Audited URL
    pub target_url: String,
    /// Serialized public report
    pub report_json: String,
    /// Publication time
    pub created_at: DateTime<Utc>,
    /// After this instant the report is no longer served
    pub expires_at: Option<DateTime<Utc>>,
}

impl PublicReportRecord {
    /// Whether the report may still be served at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires| expires > now)
    }
}

const SELECT_COLUMNS: &str = "SELECT id, target_id, run_id, token_hash, domain, target_url,
        report_json, created_at, expires_at FROM public_reports";

/// Insert a report unless one already exists for the same run.
///
/// Returns `false` when the run was already published.
pub async fn insert_if_absent(pool: &Pool<Sqlite>, record: &PublicReportRecord) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO public_reports
            (id, target_id, run_id, token_hash, domain, target_url, report_json, created_at, expires_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(run_id) DO NOTHING",
    )
    .bind(&record.id)
    .bind(record.target_id.as_str())
    .bind(record.run_id.as_str())
    .bind(&record.token_hash)
    .bind(&record.domain)
    .bind(&record.target_url)
    .bind(&record.report_json)
    .bind(to_db_timestamp(record.created_at))
    .bind(record.expires_at.map(to_db_timestamp))
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Find the report published for a run.
pub async fn find_by_run_id(
    pool: &Pool<Sqlite>,
    run_id: &RunId,
) -> Result<Option<PublicReportRecord>> {
    let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE run_id = ?"))
        .bind(run_id.as_str())
        .fetch_optional(pool)
        .await?;

    row.map(|r| record_from_row(&r)).transpose()
}

/// Find a report by the hash of its access token.
pub async fn find_by_token_hash(
    pool: &Pool<Sqlite>,
    token_hash: &str,
) -> Result<Option<PublicReportRecord>> {
    let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE token_hash = ?"))
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

    row.map(|r| record_from_row(&r)).transpose()
}

fn record_from_row(row: &SqliteRow) -> Result<PublicReportRecord> {
    let target_id: String = row.try_get("target_id")?;
    let run_id: String = row.try_get("run_id")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(PublicReportRecord {
        id: row.try_get("id")?,
        target_id: TargetId::new(target_id).map_err(|e| DatabaseError::Decode(e.to_string()))?,
        run_id: RunId::new(run_id).map_err(|e| DatabaseError::Decode(e.to_string()))?,
        token_hash: row.try_get("token_hash")?,
        domain: row.try_get("domain")?,
        target_url: row.try_get("target_url")?,
        report_json: row.try_get("report_json")?,
        created_at: from_db_timestamp("created_at", &created_at)?,
        expires_at: from_db_timestamp_opt("expires_at", row.try_get("expires_at")?)?,
    })
}
