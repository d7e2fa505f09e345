//! Per-command protocol state.
//!
//! One `Exchange` tracks everything observed between dispatching a command
//! and resolving its caller: extracted output values, the running
//! diagnostic buffer, and whether the completion sentinel has been seen.
//! It is plain state with no IO so the completion protocol can be tested
//! without a child process.

use crate::classify::{classify_diagnostic, is_fatal_diagnostic, DbError};
use crate::extract::ValueExtractor;
use crate::rows::{CellValue, RowSet};
use log::warn;

/// Token selected by the sentinel query. Chosen to be improbable as user
/// data; a query that deliberately selects this exact single-row value
/// will terminate its own exchange early.
pub const SENTINEL_TOKEN: &str = "__mallard_sentinel__";

/// Build the wire command for one dispatch: trimmed SQL terminated with
/// `;`, then the sentinel query on its own line.
pub(crate) fn build_wire_command(sql: &str) -> String {
    let trimmed = sql.trim();
    let mut wire = String::with_capacity(trimmed.len() + SENTINEL_TOKEN.len() * 2 + 32);
    wire.push_str(trimmed);
    if !trimmed.ends_with(';') {
        wire.push(';');
    }
    wire.push('\n');
    wire.push_str(&format!(
        "SELECT '{SENTINEL_TOKEN}' AS \"{SENTINEL_TOKEN}\";"
    ));
    wire.push('\n');
    wire
}

fn is_sentinel(rows: &RowSet) -> bool {
    rows.rows.len() == 1
        && rows.columns.len() == 1
        && matches!(&rows.rows[0][0], CellValue::Text(s) if s == SENTINEL_TOKEN)
}

/// What a stdout chunk did to the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StdoutSignal {
    /// The sentinel's single-row/single-column shape was observed; the
    /// command's output is fully flushed.
    SentinelSeen,
    /// Still waiting.
    Pending,
}

#[derive(Debug, Default)]
pub(crate) struct Exchange {
    extractor: ValueExtractor,
    stderr_buf: Vec<u8>,
    last_rows: Option<RowSet>,
    sentinel_seen: bool,
}

impl Exchange {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed an output-channel chunk through the extractor and materialize
    /// any completed values. The sentinel value itself is discarded from
    /// the result; of the remaining values, the last one wins.
    pub(crate) fn on_stdout(&mut self, chunk: &[u8]) -> StdoutSignal {
        for span in self.extractor.push_chunk(chunk) {
            let rows = serde_json::from_slice::<serde_json::Value>(&span)
                .map_err(|e| e.to_string())
                .and_then(|v| RowSet::from_value(v).map_err(|e| e.to_string()));
            match rows {
                Ok(rows) if is_sentinel(&rows) => self.sentinel_seen = true,
                Ok(rows) => self.last_rows = Some(rows),
                Err(e) => warn!("[DRIVER] discarding undecodable output value: {e}"),
            }
        }
        if self.sentinel_seen {
            StdoutSignal::SentinelSeen
        } else {
            StdoutSignal::Pending
        }
    }

    /// Append a diagnostic-channel chunk. Returns the classified error
    /// when the buffer matches a fatal pattern, meaning the sentinel will
    /// never execute and the caller must be resolved immediately.
    pub(crate) fn on_stderr(&mut self, chunk: &[u8]) -> Option<DbError> {
        self.stderr_buf.extend_from_slice(chunk);
        let text = String::from_utf8_lossy(&self.stderr_buf);
        if is_fatal_diagnostic(&text) {
            Some(classify_diagnostic(&text))
        } else {
            None
        }
    }

    pub(crate) fn sentinel_seen(&self) -> bool {
        self.sentinel_seen
    }

    /// Resolve the exchange after completion (sentinel seen and the settle
    /// window elapsed, or the process exited after the sentinel). Any
    /// buffered diagnostic text outranks the accumulated rows. The
    /// exchange is reset as a unit, never partially.
    pub(crate) fn resolve(&mut self) -> Result<RowSet, DbError> {
        let outcome = if self.stderr_buf.is_empty() {
            Ok(self.last_rows.take().unwrap_or_else(RowSet::empty))
        } else {
            Err(classify_diagnostic(&String::from_utf8_lossy(&self.stderr_buf)))
        };
        self.reset();
        outcome
    }

    /// Classified diagnostics for an exchange cut short by process death,
    /// if any arrived. Resets the exchange.
    pub(crate) fn take_diagnostics(&mut self) -> Option<DbError> {
        let classified = if self.stderr_buf.is_empty() {
            None
        } else {
            Some(classify_diagnostic(&String::from_utf8_lossy(&self.stderr_buf)))
        };
        self.reset();
        classified
    }

    /// Clear all per-command state in one step.
    pub(crate) fn reset(&mut self) {
        self.extractor.reset();
        self.stderr_buf.clear();
        self.last_rows = None;
        self.sentinel_seen = false;
    }
}
