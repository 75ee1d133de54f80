use thiserror::Error;

/// Errors raised while executing an audit run.
///
/// Inside the orchestrator every variant ends up as the run's `last_error`
/// through its `Display` text.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Normalization failed: {0}")]
    Normalization(String),

    #[error("Target {target_id} not found for run {run_id}")]
    TargetNotFound { run_id: String, target_id: String },

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    #[error("Database error: {0}")]
    Database(#[from] vigil_db::DatabaseError),

    #[error("{0}")]
    Core(#[from] vigil_core::VigilError),
}

pub type Result<T> = std::result::Result<T, AuditError>;
