//! Error types for the board store and its persistence gateway

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors surfaced by the board store
#[derive(Debug, Error)]
pub enum BoardError {
    /// Task id not present on the board
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// Column id is not one of the seeded columns
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// Saving or clearing the persisted board failed
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// Any other failure
    #[error("operation failed: {message}")]
    Operation { message: String },
}

impl BoardError {
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }

    /// True for lookups that missed
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound { .. } | Self::ColumnNotFound { .. })
    }
}

/// Errors raised at the persistence boundary
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend refused or is not reachable
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

impl PersistenceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
