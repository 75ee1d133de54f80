//! Public report error types.

use thiserror::Error;

/// Errors raised while publishing or reading public reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Storage failure.
    #[error("database error: {0}")]
    Database(#[from] vigil_db::DatabaseError),

    /// The public report could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for public report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
