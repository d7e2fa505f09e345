//! Diagnostic classification.
//!
//! Maps the first line of diagnostic text emitted by the database console
//! into a closed error taxonomy. Classification happens exactly once, at
//! the driver boundary; everything above it only ever sees the structured
//! kind + message, never raw text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed taxonomy of database error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Binder,
    Catalog,
    Connection,
    Constraint,
    Conversion,
    Dependency,
    Fatal,
    Http,
    Internal,
    Interrupt,
    InvalidInput,
    InvalidType,
    Io,
    NotImplemented,
    OutOfMemory,
    OutOfRange,
    Parser,
    Permission,
    Sequence,
    Serialization,
    Syntax,
    Transaction,
    TypeMismatch,
    /// Diagnostic text that matched no rule.
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Binder => "Binder",
            ErrorKind::Catalog => "Catalog",
            ErrorKind::Connection => "Connection",
            ErrorKind::Constraint => "Constraint",
            ErrorKind::Conversion => "Conversion",
            ErrorKind::Dependency => "Dependency",
            ErrorKind::Fatal => "Fatal",
            ErrorKind::Http => "HTTP",
            ErrorKind::Internal => "Internal",
            ErrorKind::Interrupt => "Interrupt",
            ErrorKind::InvalidInput => "Invalid Input",
            ErrorKind::InvalidType => "Invalid Type",
            ErrorKind::Io => "IO",
            ErrorKind::NotImplemented => "Not Implemented",
            ErrorKind::OutOfMemory => "Out of Memory",
            ErrorKind::OutOfRange => "Out of Range",
            ErrorKind::Parser => "Parser",
            ErrorKind::Permission => "Permission",
            ErrorKind::Sequence => "Sequence",
            ErrorKind::Serialization => "Serialization",
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Transaction => "Transaction",
            ErrorKind::TypeMismatch => "Type Mismatch",
            ErrorKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified database diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DbError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Error: {}", self.kind, self.message)
    }
}

impl std::error::Error for DbError {}

/// Category spellings in priority order. More specific spellings come
/// before shorter ones that would otherwise shadow them
/// ("TransactionContext" before "Transaction").
const CATEGORY_RULES: &[(&str, ErrorKind)] = &[
    ("Binder", ErrorKind::Binder),
    ("Catalog", ErrorKind::Catalog),
    ("Connection", ErrorKind::Connection),
    ("Constraint", ErrorKind::Constraint),
    ("Conversion", ErrorKind::Conversion),
    ("Dependency", ErrorKind::Dependency),
    ("FATAL", ErrorKind::Fatal),
    ("Fatal", ErrorKind::Fatal),
    ("HTTP", ErrorKind::Http),
    ("INTERNAL", ErrorKind::Internal),
    ("Internal", ErrorKind::Internal),
    ("Interrupt", ErrorKind::Interrupt),
    ("Invalid Input", ErrorKind::InvalidInput),
    ("Invalid Type", ErrorKind::InvalidType),
    ("IO", ErrorKind::Io),
    ("Not implemented", ErrorKind::NotImplemented),
    ("Out of Memory", ErrorKind::OutOfMemory),
    ("Out of Range", ErrorKind::OutOfRange),
    ("Parser", ErrorKind::Parser),
    ("Permission", ErrorKind::Permission),
    ("Sequence", ErrorKind::Sequence),
    ("Serialization", ErrorKind::Serialization),
    ("Syntax", ErrorKind::Syntax),
    ("TransactionContext", ErrorKind::Transaction),
    ("Transaction", ErrorKind::Transaction),
    ("Mismatch Type", ErrorKind::TypeMismatch),
    ("Type Mismatch", ErrorKind::TypeMismatch),
];

/// Classify diagnostic text into a [`DbError`].
///
/// Only the first line is inspected. Two input shapes are recognized:
/// `"<Category> Error: <message>"` and `"Error: <Category>: <message>"`.
/// Anything else yields [`ErrorKind::Unknown`] with the first line carried
/// verbatim as the message. This function is total: it never fails and
/// never panics.
pub fn classify_diagnostic(text: &str) -> DbError {
    let first_line = text.lines().next().unwrap_or("");
    let trimmed = first_line.trim();

    for (category, kind) in CATEGORY_RULES {
        if let Some(rest) = trimmed.strip_prefix(category) {
            if let Some(message) = rest.strip_prefix(" Error:") {
                return DbError::new(*kind, message.trim_start());
            }
        }
    }

    if let Some(rest) = trimmed.strip_prefix("Error:") {
        let rest = rest.trim_start();
        for (category, kind) in CATEGORY_RULES {
            if let Some(message) = rest
                .strip_prefix(category)
                .and_then(|r| r.strip_prefix(':'))
            {
                return DbError::new(*kind, message.trim_start());
            }
        }
    }

    DbError::new(ErrorKind::Unknown, first_line)
}

/// Whether diagnostic text signals that the whole command batch is dead
/// and the completion sentinel will never execute.
pub fn is_fatal_diagnostic(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("transaction is aborted")
        || lower.contains("database has been invalidated")
        || classify_diagnostic(text).kind == ErrorKind::Fatal
}

#[cfg(test)]
mod tests {
    use super::{classify_diagnostic, is_fatal_diagnostic, ErrorKind};

    #[test]
    fn classifies_category_error_prefix() {
        let err = classify_diagnostic("Catalog Error: Table with name x does not exist");
        assert_eq!(err.kind, ErrorKind::Catalog);
        assert_eq!(err.message, "Table with name x does not exist");
    }

    #[test]
    fn classifies_error_category_prefix() {
        let err = classify_diagnostic("Error: Syntax: unexpected token");
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.message, "unexpected token");
    }

    #[test]
    fn multi_word_categories_match() {
        let err = classify_diagnostic("Invalid Input Error: cannot open file");
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let err = classify_diagnostic("Out of Range Error: overflow");
        assert_eq!(err.kind, ErrorKind::OutOfRange);
    }

    #[test]
    fn transaction_context_maps_to_transaction() {
        let err = classify_diagnostic("TransactionContext Error: cannot commit");
        assert_eq!(err.kind, ErrorKind::Transaction);
    }

    #[test]
    fn unrecognized_text_is_unknown_with_verbatim_message() {
        let err = classify_diagnostic("something went sideways");
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, "something went sideways");
    }

    #[test]
    fn only_first_line_is_inspected() {
        let err = classify_diagnostic("Binder Error: no such column\nLINE 1: SELECT nope");
        assert_eq!(err.kind, ErrorKind::Binder);
        assert_eq!(err.message, "no such column");
    }

    #[test]
    fn empty_input_is_unknown() {
        let err = classify_diagnostic("");
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert_eq!(err.message, "");
    }

    #[test]
    fn fatal_patterns_are_detected() {
        assert!(is_fatal_diagnostic(
            "TransactionContext Error: Current transaction is aborted (please ROLLBACK)"
        ));
        assert!(is_fatal_diagnostic("FATAL Error: database storage lost"));
        assert!(!is_fatal_diagnostic("Catalog Error: Table x does not exist"));
    }
}
