//! Chronicle demo — error types.

use chronicle_core::error::DomainError;
use thiserror::Error;

/// Startup and runtime errors of the demo binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A store or entity operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A report could not be rendered.
    #[error("report error: {0}")]
    Report(#[from] serde_json::Error),
}
