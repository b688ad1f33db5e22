//! Error types for eventboard.

use thiserror::Error;

use crate::validate::ValidationErrors;

/// Errors that can occur in eventboard operations.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("An event titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("Query timed out after {0}s")]
    QueryTimeout(u64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for eventboard operations.
pub type EventResult<T> = Result<T, EventError>;
