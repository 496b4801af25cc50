// Error taxonomy for the stats, ranking and engagement services.
//
// Storage code returns anyhow::Result; services lift those failures into
// ForumError::Storage with `?` and add the three caller-facing kinds.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForumError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl ForumError {
    /// True when the caller can fix the request and retry. Storage failures
    /// are not recoverable at this layer.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ForumError::Storage(_))
    }

    pub fn not_found(what: &str, id: i64) -> Self {
        ForumError::NotFound(format!("{what} {id}"))
    }
}

/// Result type alias for service operations
pub type ForumResult<T> = Result<T, ForumError>;
