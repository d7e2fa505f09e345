//! Error types for mallard-sql

use thiserror::Error;

/// Errors produced while splitting or rewriting SQL text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Binding error: {0}")]
    Binding(String),

    #[error("Unterminated quoted string in SQL batch")]
    UnterminatedLiteral,

    #[error("Unterminated block comment in SQL batch")]
    UnterminatedComment,
}

/// Result type for SQL text operations.
pub type Result<T> = std::result::Result<T, SqlError>;
