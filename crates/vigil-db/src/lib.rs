//! Vigil Database Layer
//!
//! Provides `SQLite` access for the audit run store. Uses `SQLx` with embedded
//! migrations.
//!
//! # Architecture
//!
//! - **Targets**: one row per normalized URL, looked up before insert
//! - **Runs**: the shared work queue; claimed with a single conditional `UPDATE`
//! - **Public reports**: redacted views addressed by a token hash
//!
//! # Example
//!
//! ```ignore
//! use vigil_db::{runs, Database};
//!
//! let db = Database::new("vigil.db").await?;
//! db.run_migrations().await?;
//! let next = runs::find_next_queued(db.pool()).await?;
//! ```
//!
//! The claim is the only place where concurrent workers contend; every other
//! write touches a row the caller already owns.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod error;
pub mod migrations;
pub mod public_reports;
pub mod runs;
pub mod targets;

// Re-export commonly used types
pub use error::{DatabaseError, Result};
pub use public_reports::PublicReportRecord;
pub use runs::AuditRun;
pub use targets::Target;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Default pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// High-level database interface with migrations.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open a database at the specified path (or `:memory:` for in-memory).
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_max_connections(path, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Open a database with an explicit pool size.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn with_max_connections(path: impl AsRef<Path>, max_connections: u32) -> Result<Self> {
        let pool = connection::create_pool(path, max_connections).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the version cannot be queried.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn to_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn from_db_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Decode(format!("invalid timestamp in {column}: {e}")))
}

pub(crate) fn from_db_timestamp_opt(
    column: &str,
    raw: Option<String>,
) -> Result<Option<DateTime<Utc>>> {
    raw.map(|s| from_db_timestamp(column, &s)).transpose()
}
