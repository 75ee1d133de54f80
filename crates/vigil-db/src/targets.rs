//! Target operations.
//!
//! A target is one logical URL. The normalized URL is unique, and callers
//! look it up before inserting so re-audits attach new runs to the same row.

use crate::error::{DatabaseError, Result};
use crate::{from_db_timestamp, to_db_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};
use vigil_core::TargetId;

/// A URL under audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Unique identifier
    pub id: TargetId,
    /// URL as first submitted
    pub input_url: String,
    /// Canonical URL (dedup key)
    pub normalized_url: String,
    /// Host part of the normalized URL
    pub hostname: String,
    /// When the target was first seen
    pub created_at: DateTime<Utc>,
}

const SELECT_COLUMNS: &str = "SELECT id, input_url, normalized_url, hostname, created_at FROM targets";

/// Find the target for a normalized URL.
pub async fn find_by_normalized_url(
    pool: &Pool<Sqlite>,
    normalized_url: &str,
) -> Result<Option<Target>> {
    let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE normalized_url = ?"))
        .bind(normalized_url)
        .fetch_optional(pool)
        .await?;

    row.map(|r| target_from_row(&r)).transpose()
}

/// Get a target by id.
pub async fn get_target(pool: &Pool<Sqlite>, id: &TargetId) -> Result<Option<Target>> {
    let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
        .bind(id.as_str())
        .fetch_optional(pool)
        .await?;

    row.map(|r| target_from_row(&r)).transpose()
}

/// Insert a new target.
///
/// # Errors
/// Fails with a unique-constraint error if the normalized URL already exists;
/// use [`find_or_create_target`] when that is expected.
pub async fn create_target(
    pool: &Pool<Sqlite>,
    input_url: &str,
    normalized_url: &str,
    hostname: &str,
) -> Result<Target> {
    let target = Target {
        id: TargetId::generate(),
        input_url: input_url.to_string(),
        normalized_url: normalized_url.to_string(),
        hostname: hostname.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO targets (id, input_url, normalized_url, hostname, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(target.id.as_str())
    .bind(&target.input_url)
    .bind(&target.normalized_url)
    .bind(&target.hostname)
    .bind(to_db_timestamp(target.created_at))
    .execute(pool)
    .await?;

    Ok(target)
}

/// Return the existing target for `normalized_url`, creating it if absent.
///
/// Two callers racing on the same URL both end up with the same row: the
/// insert is a no-op on conflict and the row is re-read afterwards.
pub async fn find_or_create_target(
    pool: &Pool<Sqlite>,
    input_url: &str,
    normalized_url: &str,
    hostname: &str,
) -> Result<Target> {
    if let Some(existing) = find_by_normalized_url(pool, normalized_url).await? {
        return Ok(existing);
    }

    sqlx::query(
        "INSERT INTO targets (id, input_url, normalized_url, hostname, created_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(normalized_url) DO NOTHING",
    )
    .bind(TargetId::generate().as_str())
    .bind(input_url)
    .bind(normalized_url)
    .bind(hostname)
    .bind(to_db_timestamp(Utc::now()))
    .execute(pool)
    .await?;

    find_by_normalized_url(pool, normalized_url)
        .await?
        .ok_or_else(|| {
            DatabaseError::NotFoundWithMessage(format!(
                "Target for '{normalized_url}' vanished after insert"
            ))
        })
}

fn target_from_row(row: &SqliteRow) -> Result<Target> {
    let id: String = row.try_get("id")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Target {
        id: TargetId::new(id).map_err(|e| DatabaseError::Decode(e.to_string()))?,
        input_url: row.try_get("input_url")?,
        normalized_url: row.try_get("normalized_url")?,
        hostname: row.try_get("hostname")?,
        created_at: from_db_timestamp("created_at", &created_at)?,
    })
}
