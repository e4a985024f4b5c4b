//! Store errors.

use thiserror::Error;

/// Store error types.
///
/// Not-found conditions are not errors anywhere in this crate: point lookups
/// return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed cron expression.
    #[error("Invalid cron expression {0}")]
    InvalidSchedule(String),

    /// Generic error.
    #[error("{0}")]
    Custom(String),
}
