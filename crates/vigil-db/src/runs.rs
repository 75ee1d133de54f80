//! Audit run operations and the claim queue.
//!
//! Runs are created `QUEUED` and move forward only through [`claim_run`],
//! [`complete_run`] and [`fail_run`]. Each of these is a single conditional
//! `UPDATE`, so independent worker processes coordinate through the row
//! itself rather than through a lock manager.

use crate::error::{DatabaseError, Result};
use crate::{from_db_timestamp, from_db_timestamp_opt, to_db_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use vigil_core::{RunId, RunStatus, TargetId};

/// One execution attempt of the audit pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRun {
    /// Unique identifier
    pub id: RunId,
    /// Audited target
    pub target_id: TargetId,
    /// Lifecycle state
    pub status: RunStatus,
    /// Token of the worker that claimed the run
    pub claim_token: Option<String>,
    /// When the run was queued
    pub created_at: DateTime<Utc>,
    /// When the run was claimed
    pub started_at: Option<DateTime<Utc>>,
    /// When the run reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
    /// Serialized report (completed runs only)
    pub result_json: Option<String>,
    /// Diagnostic message (failed runs only)
    pub last_error: Option<String>,
}

const SELECT_COLUMNS: &str = "SELECT id, target_id, status, claim_token, created_at, started_at,
        finished_at, result_json, last_error FROM audit_runs";

/// Queue a new run for `target_id`.
pub async fn create_queued_run(pool: &Pool<Sqlite>, target_id: &TargetId) -> Result<AuditRun> {
    let run = AuditRun {
        id: RunId::generate(),
        target_id: target_id.clone(),
        status: RunStatus::Queued,
        claim_token: None,
        created_at: Utc::now(),
        started_at: None,
        finished_at: None,
        result_json: None,
        last_error: None,
    };

    sqlx::query(
        "INSERT INTO audit_runs (id, target_id, status, created_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(run.id.as_str())
    .bind(run.target_id.as_str())
    .bind(run.status.as_str())
    .bind(to_db_timestamp(run.created_at))
    .execute(pool)
    .await?;

    tracing::debug!(run_id = %run.id, target_id = %run.target_id, "queued audit run");

    Ok(run)
}

/// Get a run by id.
pub async fn get_run(pool: &Pool<Sqlite>, id: &RunId) -> Result<Option<AuditRun>> {
    let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.map(|r| run_from_row(&r)).transpose()
}

/// Oldest unclaimed queued run, FIFO by creation time.
///
/// This is only a hint: another worker may claim the run between this read
/// and the caller's [`claim_run`].
pub async fn find_next_queued(pool: &Pool<Sqlite>) -> Result<Option<AuditRun>> {
    let row = sqlx::query(&format!(
        "{SELECT_COLUMNS} WHERE status = 'QUEUED' AND claim_token IS NULL
         ORDER BY created_at ASC, rowid ASC LIMIT 1"
    ))
    .fetch_optional(pool)
    .await?;

    row.map(|r| run_from_row(&r)).transpose()
}

/// Atomically claim a queued run.
///
/// Succeeds only if the run is still `QUEUED` and unclaimed at the moment of
/// the write, in which case it becomes `RUNNING` under `token`. Returns
/// `false` when another worker won; that is a normal outcome.
pub async fn claim_run(
    pool: &Pool<Sqlite>,
    id: &RunId,
    token: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE audit_runs
         SET status = 'RUNNING', claim_token = ?, started_at = ?
         WHERE id = ? AND status = 'QUEUED' AND claim_token IS NULL",
    )
    .bind(token)
    .bind(to_db_timestamp(now))
    .bind(id.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Store the report and move a running run to `COMPLETED`.
///
/// # Errors
/// Returns `DatabaseError::Conflict` if the run is not `RUNNING` under `token`.
pub async fn complete_run(
    pool: &Pool<Sqlite>,
    id: &RunId,
    token: &str,
    result_json: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE audit_runs
         SET status = 'COMPLETED', finished_at = ?, result_json = ?, last_error = NULL
         WHERE id = ? AND status = 'RUNNING' AND claim_token = ?",
    )
    .bind(to_db_timestamp(now))
    .bind(result_json)
    .bind(id.as_str())
    .bind(token)
    .execute(pool)
    .await?;

    ensure_transitioned(result.rows_affected(), id, "complete")
}

/// Record `message` and move a running run to `FAILED`.
///
/// # Errors
/// Returns `DatabaseError::Conflict` if the run is not `RUNNING` under `token`.
pub async fn fail_run(
    pool: &Pool<Sqlite>,
    id: &RunId,
    token: &str,
    message: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE audit_runs
         SET status = 'FAILED', finished_at = ?, last_error = ?, result_json = NULL
         WHERE id = ? AND status = 'RUNNING' AND claim_token = ?",
    )
    .bind(to_db_timestamp(now))
    .bind(message)
    .bind(id.as_str())
    .bind(token)
    .execute(pool)
    .await?;

    ensure_transitioned(result.rows_affected(), id, "fail")
}

/// All runs of a target, newest first.
pub async fn list_runs_for_target(
    pool: &Pool<Sqlite>,
    target_id: &TargetId,
) -> Result<Vec<AuditRun>> {
    let rows = sqlx::query(&format!(
        "{SELECT_COLUMNS} WHERE target_id = ? ORDER BY created_at DESC, rowid DESC"
    ))
    .bind(target_id.as_str())
    .fetch_all(pool)
    .await?;

    rows.iter().map(run_from_row).collect()
}

fn ensure_transitioned(rows_affected: u64, id: &RunId, action: &str) -> Result<()> {
    if rows_affected == 0 {
        return Err(DatabaseError::Conflict(format!(
            "cannot {action} run '{id}': not RUNNING under this claim"
        )));
    }
    Ok(())
}

fn run_from_row(row: &SqliteRow) -> Result<AuditRun> {
    let id: String = row.try_get("id")?;
    let target_id: String = row.try_get("target_id")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(AuditRun {
        id: RunId::new(id).map_err(|e| DatabaseError::Decode(e.to_string()))?,
        target_id: TargetId::new(target_id).map_err(|e| DatabaseError::Decode(e.to_string()))?,
        status: RunStatus::parse(&status).map_err(|e| DatabaseError::Decode(e.to_string()))?,
        claim_token: row.try_get("claim_token")?,
        created_at: from_db_timestamp("created_at", &created_at)?,
        started_at: from_db_timestamp_opt("started_at", row.try_get("started_at")?)?,
        finished_at: from_db_timestamp_opt("finished_at", row.try_get("finished_at")?)?,
        result_json: row.try_get("result_json")?,
        last_error: row.try_get("last_error")?,
    })
}
