//! Engine driven as a child process.
//!
//! The child reads its start config as one line on stdin and answers with
//! one JSON line on stdout: `{"port": N}` when ready or `{"error": "..."}`.
//! Closing stdin asks it to stop; it is killed if it has not exited within
//! the stop grace period.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::config::defaults::default_stop_timeout_ms;
use crate::engine::errors::EngineError;
use crate::engine::types::{Engine, EngineHandle};

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Deserialize)]
struct ReadyLine {
    #[serde(default)]
    port: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

struct RunningEngine {
    child: Child,
    stdin: Option<ChildStdin>,
}

pub struct ProcessEngine {
    command: String,
    args: Vec<String>,
    start_timeout: Duration,
    stop_grace: Duration,
    running: Mutex<Option<RunningEngine>>,
}

impl ProcessEngine {
    pub fn new(command: impl Into<String>, args: Vec<String>, start_timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            start_timeout,
            stop_grace: Duration::from_millis(default_stop_timeout_ms()),
            running: Mutex::new(None),
        }
    }

    /// How long `stop` waits for the engine to exit on its own.
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let command = config.command.as_deref().ok_or(EngineError::NotConfigured)?;
        Ok(Self::new(
            command,
            config.args.clone(),
            Duration::from_millis(config.start_timeout_ms),
        )
        .with_stop_grace(Duration::from_millis(config.stop_timeout_ms)))
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<RunningEngine>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn(&self) -> Result<Child, EngineError> {
        Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| EngineError::SpawnFailed {
                command: self.command.clone(),
                message: e.to_string(),
            })
    }

    /// Send the config and wait for the readiness line.
    fn handshake(&self, child: &mut Child, config: &str) -> Result<(ChildStdin, EngineHandle), EngineError> {
        let mut stdin = child.stdin.take().ok_or_else(|| EngineError::Protocol {
            message: "engine stdin unavailable".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| EngineError::Protocol {
            message: "engine stdout unavailable".to_string(),
        })?;

        let line = format!("{}\n", config.replace(['\r', '\n'], " "));
        stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.flush())
            .map_err(|e| EngineError::StartFailed {
                message: format!("failed to send start config: {}", e),
            })?;

        let (ready_tx, ready_rx) = mpsc::channel();
        std::thread::spawn(move || drain_stdout(stdout, ready_tx));

        let ready = match ready_rx.recv_timeout(self.start_timeout) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => {
                return Err(EngineError::StartTimedOut {
                    timeout_ms: self.start_timeout.as_millis() as u64,
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(EngineError::StartFailed {
                    message: "engine exited before reporting readiness".to_string(),
                });
            }
        };

        let handle = parse_ready(&ready)?;
        Ok((stdin, handle))
    }
}

impl Engine for ProcessEngine {
    fn start(&self, config: &str) -> Result<EngineHandle, EngineError> {
        let mut running = self.lock();
        if running.is_some() {
            return Err(EngineError::AlreadyStarted);
        }

        info!(event = "core.engine.start_started", command = self.command);

        let mut child = self.spawn()?;

        match self.handshake(&mut child, config) {
            Ok((stdin, handle)) => {
                info!(
                    event = "core.engine.start_completed",
                    pid = child.id(),
                    handle = handle.get(),
                );
                *running = Some(RunningEngine {
                    child,
                    stdin: Some(stdin),
                });
                Ok(handle)
            }
            Err(e) => {
                error!(event = "core.engine.start_failed", error = %e);
                reap(&mut child);
                Err(e)
            }
        }
    }

    fn stop(&self) {
        let Some(mut engine) = self.lock().take() else {
            return;
        };

        let pid = engine.child.id();
        drop(engine.stdin.take());

        if !wait_for_exit(&mut engine.child, self.stop_grace) {
            warn!(
                event = "core.engine.stop_grace_elapsed",
                pid,
                grace_ms = self.stop_grace.as_millis() as u64,
            );
            reap(&mut engine.child);
        }
        info!(event = "core.engine.stop_completed", pid);
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn parse_ready(line: &str) -> Result<EngineHandle, EngineError> {
    let ready: ReadyLine = serde_json::from_str(line.trim()).map_err(|e| EngineError::Protocol {
        message: format!("invalid readiness line '{}': {}", line.trim(), e),
    })?;

    if let Some(message) = ready.error {
        return Err(EngineError::StartFailed { message });
    }

    match ready.port {
        Some(port) => EngineHandle::new(port),
        None => Err(EngineError::Protocol {
            message: "readiness line has neither port nor error".to_string(),
        }),
    }
}

/// Forward the first stdout line, then log the rest until the engine exits.
fn drain_stdout(stdout: std::process::ChildStdout, ready_tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(stdout).lines();

    match lines.next() {
        Some(Ok(line)) => {
            let _ = ready_tx.send(line);
        }
        Some(Err(e)) => {
            warn!(event = "core.engine.stdout_read_failed", error = %e);
            return;
        }
        None => return,
    }
    drop(ready_tx);

    for line in lines.map_while(Result::ok) {
        debug!(event = "core.engine.output", line = line);
    }
}

/// Poll until `child` exits or `grace` elapses. True if it exited.
fn wait_for_exit(child: &mut Child, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(event = "core.engine.exited", pid = child.id(), status = %status);
                return true;
            }
            Ok(None) if Instant::now() < deadline => std::thread::sleep(STOP_POLL_INTERVAL),
            Ok(None) => return false,
            Err(e) => {
                warn!(event = "core.engine.wait_failed", pid = child.id(), error = %e);
                return false;
            }
        }
    }
}

fn reap(child: &mut Child) {
    if let Err(e) = child.kill()
        && e.kind() != std::io::ErrorKind::InvalidInput
    {
        warn!(event = "core.engine.kill_failed", pid = child.id(), error = %e);
    }

    if let Err(e) = child.wait() {
        warn!(event = "core.engine.wait_failed", pid = child.id(), error = %e);
    }
}
