//! Error types for executing generated SQL.

use std::time::Duration;

use oxide_contrib_core::CoreError;
use thiserror::Error;

/// Errors raised while running CRUD, paging or bulk operations.
#[derive(Debug, Error)]
pub enum ContribError {
    /// Statement generation or row mapping failed before or after the
    /// database round trip.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A statement did not complete within the command timeout.
    #[error("statement timed out after {0:?}")]
    Timeout(Duration),

    /// The database returned something the operation cannot interpret.
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ContribError {
    /// Returns the generation error, if this is one.
    #[must_use]
    pub const fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for execution operations.
pub type Result<T> = std::result::Result<T, ContribError>;
