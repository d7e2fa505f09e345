//! Subprocess driver.
//!
//! Owns the console child process and exposes a one-request-one-reply API
//! over its unstructured stdio channels. A single background task holds
//! the process handle and consumes one tagged event stream (output chunk,
//! diagnostic chunk, settle timer, process exit); callers talk to it
//! through a command channel with oneshot replies, so at most one command
//! is ever in flight and later callers queue upstream.

use crate::config::DriverConfig;
use crate::error::{LinkError, Result};
use crate::exchange::{build_wire_command, Exchange, StdoutSignal};
use crate::rows::RowSet;
use bytes::Bytes;
use log::{debug, warn};
use mallard_sql::{bind_parameters, split_statements, SqlError, SqlParams};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};

/// Capacity for the inbound event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Capacity for the caller command channel; excess callers queue here.
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Sleep target when no settle window is armed.
/// ~100 years is far enough into the future to be effectively "never".
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Commands sent from the public API to the background driver task.
enum DriverCmd {
    Dispatch {
        sql: String,
        result_tx: oneshot::Sender<Result<RowSet>>,
    },
    LastResult {
        result_tx: oneshot::Sender<Option<RowSet>>,
    },
    LastSql {
        result_tx: oneshot::Sender<Option<String>>,
    },
    Stop {
        result_tx: oneshot::Sender<()>,
    },
}

/// Events produced by the channel reader tasks.
enum DriverEvent {
    Stdout(Bytes),
    Stderr(Bytes),
}

struct PendingCall {
    result_tx: oneshot::Sender<Result<RowSet>>,
}

/// Handle to a running console driver.
///
/// Cheap to clone; all clones talk to the same background task and the
/// same child process. Dropping every clone stops the driver and kills
/// the process.
#[derive(Clone, Debug)]
pub struct Driver {
    cmd_tx: mpsc::Sender<DriverCmd>,
    alive: Arc<AtomicBool>,
}

impl Driver {
    /// Launch the console binary and start the background driver task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: DriverConfig) -> Result<Self> {
        let mut child = Command::new(&config.binary_path)
            .args(config.command_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                LinkError::process(format!(
                    "failed to start {}: {e}",
                    config.binary_path.display()
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LinkError::process("console stdin channel unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| LinkError::process("console stdout channel unavailable"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| LinkError::process("console stderr channel unavailable"))?;

        let (evt_tx, evt_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(pump_channel(stdout, evt_tx.clone(), DriverEvent::Stdout));
        tokio::spawn(pump_channel(stderr, evt_tx, DriverEvent::Stderr));

        debug!(
            "[DRIVER_PROC] started {} targeting {:?}",
            config.binary_path.display(),
            config.database
        );

        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let alive = Arc::new(AtomicBool::new(true));
        tokio::spawn(run_loop(child, stdin, cmd_rx, evt_rx, config, alive.clone()));

        Ok(Self { cmd_tx, alive })
    }

    /// Send raw SQL to the console and wait for its completed output.
    ///
    /// The text is dispatched as-is (plus the completion sentinel); no
    /// splitting or parameter binding is applied. Resolves with the last
    /// result set the command produced, an empty one if it produced none,
    /// or the classified database error.
    pub async fn dispatch(&self, sql: impl Into<String>) -> Result<RowSet> {
        let (result_tx, result_rx) = oneshot::channel();
        self.cmd_tx
            .send(DriverCmd::Dispatch {
                sql: sql.into(),
                result_tx,
            })
            .await
            .map_err(|_| LinkError::Closed)?;
        result_rx.await.map_err(|_| LinkError::Closed)?
    }

    /// Split, validate, and dispatch a SQL batch.
    pub async fn query(&self, sql: &str) -> Result<RowSet> {
        self.query_with_params(sql, &SqlParams::None).await
    }

    /// Split and validate a SQL batch, bind the parameter set against each
    /// statement, and dispatch the rewritten text.
    pub async fn query_with_params(&self, sql: &str, params: &SqlParams) -> Result<RowSet> {
        let statements = split_statements(sql)?;
        if statements.is_empty() {
            return Err(LinkError::Sql(SqlError::Parse("Empty command".into())));
        }
        let mut bound = Vec::with_capacity(statements.len());
        for statement in &statements {
            bound.push(bind_parameters(&statement.text, params)?);
        }
        self.dispatch(bound.join(";\n")).await
    }

    /// The result of the most recent successful command, if any.
    pub async fn last_result(&self) -> Result<Option<RowSet>> {
        let (result_tx, result_rx) = oneshot::channel();
        self.cmd_tx
            .send(DriverCmd::LastResult { result_tx })
            .await
            .map_err(|_| LinkError::Closed)?;
        result_rx.await.map_err(|_| LinkError::Closed)
    }

    /// The SQL text of the most recent dispatch, if any.
    pub async fn last_sql(&self) -> Result<Option<String>> {
        let (result_tx, result_rx) = oneshot::channel();
        self.cmd_tx
            .send(DriverCmd::LastSql { result_tx })
            .await
            .map_err(|_| LinkError::Closed)?;
        result_rx.await.map_err(|_| LinkError::Closed)
    }

    /// Stop the driver and kill the console process. Idempotent; waits
    /// for any in-flight command to resolve first.
    pub async fn stop(&self) {
        let (result_tx, result_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(DriverCmd::Stop { result_tx })
            .await
            .is_ok()
        {
            let _ = result_rx.await;
        }
    }

    /// Whether the background task and its child process are still up.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

/// Read one stdio channel and forward its chunks as tagged events.
async fn pump_channel<R>(mut reader: R, evt_tx: mpsc::Sender<DriverEvent>, tag: fn(Bytes) -> DriverEvent)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if evt_tx
                    .send(tag(Bytes::copy_from_slice(&buf[..n])))
                    .await
                    .is_err()
                {
                    break;
                }
            },
        }
    }
}

async fn write_command(stdin: &mut ChildStdin, wire: &str) -> Result<()> {
    stdin
        .write_all(wire.as_bytes())
        .await
        .map_err(|e| LinkError::process(format!("failed to write command: {e}")))?;
    stdin
        .flush()
        .await
        .map_err(|e| LinkError::process(format!("failed to flush command: {e}")))?;
    Ok(())
}

/// The sequential driver actor. Processes one inbound event at a time and
/// guarantees exactly one resolution per dispatched command.
async fn run_loop(
    mut child: Child,
    mut stdin: ChildStdin,
    mut cmd_rx: mpsc::Receiver<DriverCmd>,
    mut evt_rx: mpsc::Receiver<DriverEvent>,
    config: DriverConfig,
    alive: Arc<AtomicBool>,
) {
    let settle = tokio::time::sleep(FAR_FUTURE);
    tokio::pin!(settle);
    let mut settling = false;

    let mut exchange = Exchange::new();
    let mut pending: Option<PendingCall> = None;
    let mut last_result: Option<RowSet> = None;
    let mut last_sql: Option<String> = None;
    let mut evt_open = true;

    loop {
        tokio::select! {
            // New commands are only consumed while idle; single-flight.
            cmd = cmd_rx.recv(), if pending.is_none() => {
                match cmd {
                    None => {
                        debug!("[DRIVER] all handles dropped, shutting down");
                        let _ = child.kill().await;
                        break;
                    },
                    Some(DriverCmd::Dispatch { sql, result_tx }) => {
                        let wire = build_wire_command(&sql);
                        debug!("[DRIVER] dispatching command ({} bytes)", wire.len());
                        match write_command(&mut stdin, &wire).await {
                            Ok(()) => {
                                last_sql = Some(sql);
                                pending = Some(PendingCall { result_tx });
                            },
                            Err(e) => {
                                let _ = result_tx.send(Err(e));
                            },
                        }
                    },
                    Some(DriverCmd::LastResult { result_tx }) => {
                        let _ = result_tx.send(last_result.clone());
                    },
                    Some(DriverCmd::LastSql { result_tx }) => {
                        let _ = result_tx.send(last_sql.clone());
                    },
                    Some(DriverCmd::Stop { result_tx }) => {
                        debug!("[DRIVER] stop requested");
                        let _ = child.kill().await;
                        alive.store(false, Ordering::SeqCst);
                        let _ = result_tx.send(());
                        break;
                    },
                }
            }

            evt = evt_rx.recv(), if evt_open => {
                match evt {
                    Some(DriverEvent::Stdout(bytes)) => {
                        if pending.is_some() {
                            let signal = exchange.on_stdout(&bytes);
                            if !settling && signal == StdoutSignal::SentinelSeen {
                                debug!(
                                    "[DRIVER] sentinel observed, settling for {:?}",
                                    config.settle_delay
                                );
                                settle.as_mut().reset(Instant::now() + config.settle_delay);
                                settling = true;
                            }
                        } else {
                            debug!("[DRIVER] {} stdout bytes while idle", bytes.len());
                        }
                    },
                    Some(DriverEvent::Stderr(bytes)) => {
                        warn!(
                            "[DRIVER] stderr: {}",
                            String::from_utf8_lossy(&bytes).trim_end()
                        );
                        if pending.is_some() {
                            if let Some(fatal) = exchange.on_stderr(&bytes) {
                                // The sentinel will never execute; resolve now.
                                settling = false;
                                exchange.reset();
                                if let Some(call) = pending.take() {
                                    let _ = call.result_tx.send(Err(LinkError::Database(fatal)));
                                }
                            }
                        }
                    },
                    None => {
                        evt_open = false;
                    },
                }
            }

            () = &mut settle, if settling => {
                settling = false;
                if let Some(call) = pending.take() {
                    match exchange.resolve() {
                        Ok(rows) => {
                            debug!("[DRIVER] command resolved with {} row(s)", rows.len());
                            last_result = Some(rows.clone());
                            let _ = call.result_tx.send(Ok(rows));
                        },
                        Err(db) => {
                            debug!("[DRIVER] command resolved with error: {db}");
                            let _ = call.result_tx.send(Err(LinkError::Database(db)));
                        },
                    }
                }
            }

            status = child.wait() => {
                let status_str = match &status {
                    Ok(s) => s.to_string(),
                    Err(e) => format!("wait failed: {e}"),
                };
                warn!("[DRIVER_PROC] console process exited: {status_str}");

                // Give the pipes a moment to flush, then drain whatever the
                // reader tasks already queued before deciding the outcome.
                tokio::time::sleep(config.settle_delay).await;
                while let Ok(evt) = evt_rx.try_recv() {
                    match evt {
                        DriverEvent::Stdout(bytes) if pending.is_some() => {
                            exchange.on_stdout(&bytes);
                        },
                        DriverEvent::Stderr(bytes) if pending.is_some() => {
                            let _ = exchange.on_stderr(&bytes);
                        },
                        _ => {},
                    }
                }

                if let Some(call) = pending.take() {
                    let outcome = if exchange.sentinel_seen() {
                        // Completed; the process just happened to die after.
                        exchange.resolve().map_err(LinkError::Database)
                    } else if let Some(db) = exchange.take_diagnostics() {
                        Err(LinkError::Database(db))
                    } else {
                        Err(LinkError::process(format!(
                            "console process exited before completing the command ({status_str})"
                        )))
                    };
                    let _ = call.result_tx.send(outcome);
                }
                break;
            }
        }
    }

    alive.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_driver() -> Driver {
        let (cmd_tx, _) = mpsc::channel(1);
        Driver {
            cmd_tx,
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    #[tokio::test]
    async fn dispatch_on_closed_driver_fails() {
        let driver = closed_driver();
        let err = driver.dispatch("SELECT 1").await.unwrap_err();
        assert!(matches!(err, LinkError::Closed));
        assert!(!driver.is_alive());
        assert!(format!("{driver:?}").contains("Driver"));
    }

    #[tokio::test]
    async fn query_validates_sql_before_dispatch() {
        // Invalid SQL must fail in the splitter without touching the
        // (closed) command channel.
        let driver = closed_driver();
        let err = driver.query("MUNGE the data").await.unwrap_err();
        assert!(matches!(err, LinkError::Sql(_)));

        let err = driver.query("  ").await.unwrap_err();
        assert!(matches!(err, LinkError::Sql(SqlError::Parse(_))));
    }

    #[tokio::test]
    async fn query_binds_parameters_before_dispatch() {
        let driver = closed_driver();
        let params = SqlParams::positional([1i64, 2i64]);
        // Count mismatch surfaces as a binding error, not a dispatch.
        let err = driver
            .query_with_params("SELECT ?", &params)
            .await
            .unwrap_err();
        assert!(matches!(err, LinkError::Sql(SqlError::Binding(_))));
    }
}
