//! mallard-link - Drive an analytical database through its console.
//!
//! Provides the primary interface for launching the database console as a
//! child process and executing SQL against it over stdio. The console's
//! unstructured terminal stream is turned into a reliable
//! one-request-one-reply channel by appending a synthetic sentinel query
//! after every command and watching the output stream for its distinctive
//! single-row shape; diagnostic text is classified into a typed taxonomy
//! at the same boundary.
//!
//! # Example
//!
//! ```rust,no_run
//! use mallard_link::{Driver, DriverConfig};
//! use mallard_sql::SqlParams;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let driver = Driver::start(DriverConfig::new())?;
//!
//! let rows = driver.query("SELECT 42 AS answer").await?;
//! assert_eq!(rows.columns, vec!["answer"]);
//!
//! let params = SqlParams::positional([7i64]);
//! let rows = driver.query_with_params("SELECT ? AS n", &params).await?;
//!
//! driver.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
pub mod registry;
pub mod rows;

mod exchange;

pub use classify::{classify_diagnostic, is_fatal_diagnostic, DbError, ErrorKind};
pub use config::{DatabaseTarget, DriverConfig, DEFAULT_SETTLE_DELAY};
pub use driver::Driver;
pub use exchange::SENTINEL_TOKEN;
pub use error::{LinkError, Result};
pub use extract::ValueExtractor;
pub use registry::{clear_default, default_driver, set_default};
pub use rows::{CellType, CellValue, RowSet};

// Re-exported so callers can build parameter sets without a direct
// dependency on mallard-sql.
pub use mallard_sql::{SqlParams, SqlValue};
