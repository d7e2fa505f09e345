//! Error types for mallard-link.

use crate::classify::DbError;
use thiserror::Error;

/// Errors surfaced to callers of the driver.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The database reported a diagnostic; already classified.
    #[error("{0}")]
    Database(DbError),

    /// SQL text could not be split or bound.
    #[error("SQL error: {0}")]
    Sql(#[from] mallard_sql::SqlError),

    /// The child process could not be spawned, died, or its channels broke.
    #[error("Process error: {0}")]
    Process(String),

    /// Structured output could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The driver has been stopped or its background task is gone.
    #[error("Driver is closed")]
    Closed,
}

impl LinkError {
    pub(crate) fn process(msg: impl Into<String>) -> Self {
        LinkError::Process(msg.into())
    }
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, LinkError>;
