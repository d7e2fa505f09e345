//! Driver configuration.
//!
//! Selects the console binary, the database target, and protocol tuning.
//! The binary is launched in its structured (JSON), non-interactive batch
//! output mode; locating or installing the binary is the caller's problem.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Default settle window after sentinel detection. Diagnostic bytes are
/// buffered independently of output bytes, so a short wait absorbs stderr
/// that lands just after the sentinel. Best effort, not a hard guarantee.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Which database the console should open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DatabaseTarget {
    /// Transient in-memory database.
    #[default]
    InMemory,
    /// Database file on disk.
    Path(PathBuf),
}

impl DatabaseTarget {
    fn as_arg(&self) -> OsString {
        match self {
            DatabaseTarget::InMemory => OsString::from(":memory:"),
            DatabaseTarget::Path(path) => path.clone().into_os_string(),
        }
    }
}

/// Configuration for spawning a [`Driver`](crate::Driver).
///
/// # Example
///
/// ```
/// use mallard_link::{DatabaseTarget, DriverConfig};
/// use std::time::Duration;
///
/// let config = DriverConfig::new()
///     .with_database(DatabaseTarget::Path("analytics.db".into()))
///     .read_only(true)
///     .with_settle_delay(Duration::from_millis(20));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub(crate) binary_path: PathBuf,
    pub(crate) database: DatabaseTarget,
    pub(crate) read_only: bool,
    pub(crate) settle_delay: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("duckdb"),
            database: DatabaseTarget::InMemory,
            read_only: false,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path to the console binary (default: `duckdb` on `$PATH`).
    pub fn with_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary_path = path.into();
        self
    }

    pub fn with_database(mut self, database: DatabaseTarget) -> Self {
        self.database = database;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Override the post-sentinel settle window.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Argument vector for the structured batch output mode.
    pub(crate) fn command_args(&self) -> Vec<OsString> {
        let mut args = vec![OsString::from("-batch"), OsString::from("-json")];
        if self.read_only {
            args.push(OsString::from("-readonly"));
        }
        args.push(self.database.as_arg());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::{DatabaseTarget, DriverConfig};
    use std::ffi::OsString;

    #[test]
    fn default_targets_in_memory() {
        let args = DriverConfig::new().command_args();
        assert_eq!(
            args,
            vec![
                OsString::from("-batch"),
                OsString::from("-json"),
                OsString::from(":memory:"),
            ]
        );
    }

    #[test]
    fn read_only_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("analytics.db");
        let args = DriverConfig::new()
            .with_database(DatabaseTarget::Path(db.clone()))
            .read_only(true)
            .command_args();
        assert_eq!(args[2], OsString::from("-readonly"));
        assert_eq!(args[3], db.into_os_string());
    }
}
