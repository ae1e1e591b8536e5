//! Window host without a GUI toolkit.
//!
//! Keeps the window state in memory and waits on a tokio runtime for quit
//! or a shutdown signal. The desktop build plugs its toolkit window in
//! through the same traits.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::activation::ActivationPayload;
use crate::window::errors::WindowError;
use crate::window::traits::{PrimaryWindow, WindowHost};
use crate::window::types::{ShowCommand, ShowState, WindowSpec};

/// Activations kept in memory; older ones are dropped.
pub const MAX_RECORDS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    /// Arguments the primary itself was launched with.
    Startup,
    /// Arguments handed over by a later launch.
    Forwarded,
}

/// One batch of activation arguments received by the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationRecord {
    pub kind: ActivationKind,
    pub links: Vec<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug)]
struct WindowState {
    show: ShowState,
    foreground: bool,
    records: VecDeque<ActivationRecord>,
}

#[derive(Debug)]
pub struct HeadlessWindow {
    spec: WindowSpec,
    echo: bool,
    state: Mutex<WindowState>,
}

impl HeadlessWindow {
    pub fn new(spec: WindowSpec, echo: bool) -> Self {
        Self::with_state(spec, ShowState::Normal, echo)
    }

    pub fn with_state(spec: WindowSpec, show: ShowState, echo: bool) -> Self {
        Self {
            spec,
            echo,
            state: Mutex::new(WindowState {
                show,
                foreground: show != ShowState::Minimized,
                records: VecDeque::new(),
            }),
        }
    }

    pub fn spec(&self) -> &WindowSpec {
        &self.spec
    }

    /// The last [`MAX_RECORDS`] activations received, oldest first.
    pub fn records(&self) -> Vec<ActivationRecord> {
        self.lock().records.iter().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, kind: ActivationKind, links: Vec<String>) {
        let record = ActivationRecord {
            kind,
            links,
            received_at: Utc::now(),
        };

        if self.echo {
            match serde_json::to_string(&record) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!(event = "core.window.echo_failed", error = %e),
            }
        }

        let mut state = self.lock();
        if state.records.len() == MAX_RECORDS {
            state.records.pop_front();
        }
        state.records.push_back(record);
    }
}

impl PrimaryWindow for HeadlessWindow {
    fn title(&self) -> &str {
        &self.spec.title
    }

    fn show_state(&self) -> ShowState {
        self.lock().show
    }

    fn is_foreground(&self) -> bool {
        self.lock().foreground
    }

    fn apply_show_command(&self, command: ShowCommand) -> Result<(), WindowError> {
        let mut state = self.lock();
        state.show = state.show.apply(command);
        if state.show == ShowState::Minimized {
            state.foreground = false;
        }
        Ok(())
    }

    fn bring_to_foreground(&self) -> Result<(), WindowError> {
        let mut state = self.lock();
        if state.show == ShowState::Minimized {
            return Err(WindowError::OperationFailed {
                message: "cannot focus a minimized window".to_string(),
            });
        }
        state.foreground = true;
        Ok(())
    }

    fn open_links(&self, links: Vec<String>) -> Result<(), WindowError> {
        self.record(ActivationKind::Forwarded, links);
        Ok(())
    }
}

/// Hosts a [`HeadlessWindow`] until quit, Ctrl-C, or SIGTERM.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    echo: bool,
}

impl HeadlessHost {
    /// With `echo`, every activation is printed to stdout as a JSON line.
    pub fn new(echo: bool) -> Self {
        Self { echo }
    }
}

impl WindowHost for HeadlessHost {
    type Window = HeadlessWindow;

    fn create_window(
        &self,
        spec: &WindowSpec,
        startup_args: ActivationPayload,
    ) -> Result<Arc<HeadlessWindow>, WindowError> {
        spec.validate()?;

        let window = HeadlessWindow::new(spec.clone(), self.echo);
        window.record(ActivationKind::Startup, startup_args.into_vec());

        info!(
            event = "core.window.create_completed",
            title = spec.title,
            x = spec.origin.0,
            y = spec.origin.1,
            width = spec.size.0,
            height = spec.size.1,
        );

        Ok(Arc::new(window))
    }

    fn run_event_loop(
        &self,
        _window: Arc<HeadlessWindow>,
        shutdown: &CancellationToken,
    ) -> Result<(), WindowError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| WindowError::EventLoopFailed {
                message: format!("failed to start runtime: {}", e),
            })?;

        runtime.block_on(async {
            info!(event = "core.window.event_loop_started");

            tokio::select! {
                _ = shutdown.cancelled() => {}
                signal = shutdown_signal() => {
                    info!(event = "core.window.signal_received", signal = signal);
                    shutdown.cancel();
                }
            }

            info!(event = "core.window.event_loop_completed");
        });

        Ok(())
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            warn!(event = "core.window.sigterm_unavailable", error = %e);
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = term.recv() => "SIGTERM",
    }
}

#[cfg(windows)]
async fn shutdown_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "CTRL_C"
}
