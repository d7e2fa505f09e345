//! mallard-sql - Quote-aware SQL text processing
//!
//! This crate provides the text-side half of the mallard console driver:
//! - Statement splitting on top-level semicolons, with per-statement kind
//!   classification and declared-parameter extraction
//! - Parameter binding for `?`, `$n`, and `:name` placeholders
//! - SQL literal encoding for bound values
//!
//! All scanning is quote-aware: semicolons and placeholder characters
//! inside single- or double-quoted literals (including doubled-quote
//! escapes) are never treated as syntax.
//!
//! # Example
//!
//! ```
//! use mallard_sql::{bind_parameters, split_statements, SqlParams, StatementKind};
//!
//! let statements = split_statements("SELECT 1; INSERT INTO t VALUES (?)").unwrap();
//! assert_eq!(statements[0].kind, StatementKind::Select);
//! assert_eq!(statements[1].kind, StatementKind::Insert);
//!
//! let params = SqlParams::positional([42i64]);
//! let bound = bind_parameters(&statements[1].text, &params).unwrap();
//! assert_eq!(bound, "INSERT INTO t VALUES (42)");
//! ```

pub mod binder;
pub mod error;
pub mod keywords;
pub mod lexer;
pub mod splitter;
pub mod values;

pub use binder::bind_parameters;
pub use error::{Result, SqlError};
pub use keywords::LeadingKeyword;
pub use lexer::QuoteState;
pub use splitter::{scan_parameters, split_statements, Statement, StatementKind};
pub use values::{SqlParams, SqlValue};
