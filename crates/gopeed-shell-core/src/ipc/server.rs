use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::BufReader;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::ShellError;
use crate::instance::Endpoint;
use crate::ipc::codec::{read_message, write_message};
use crate::ipc::errors::IpcError;
use crate::ipc::messages::{ClientMessage, InstanceMessage};
use crate::ipc::transport::{InstanceListener, ServerStream};
use crate::window::PrimaryWindow;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// A connection that sends nothing for this long is closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// How many activation ids are remembered for spotting repeats.
const RECENT_ACTIVATIONS: usize = 64;

/// Activation ids already handed to the window, oldest first.
#[derive(Debug, Default)]
struct RecentActivations {
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl RecentActivations {
    /// Record `activation`. Returns false if it was already recorded.
    fn insert(&mut self, activation: &str) -> bool {
        if self.seen.contains(activation) {
            return false;
        }

        if self.order.len() == RECENT_ACTIVATIONS
            && let Some(oldest) = self.order.pop_front()
        {
            self.seen.remove(&oldest);
        }

        self.order.push_back(activation.to_string());
        self.seen.insert(activation.to_string());
        true
    }

    fn forget(&mut self, activation: &str) {
        if self.seen.remove(activation) {
            self.order.retain(|a| a != activation);
        }
    }
}

/// State shared by every connection of one [`serve`] call.
struct Shared<W: ?Sized> {
    window: Arc<W>,
    recent: Mutex<RecentActivations>,
    shutdown: CancellationToken,
}

impl<W: ?Sized> Shared<W> {
    fn recent(&self) -> std::sync::MutexGuard<'_, RecentActivations> {
        self.recent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serve requests from later launches until `shutdown` is cancelled.
///
/// A `quit` request cancels `shutdown` itself.
pub async fn serve<W>(listener: InstanceListener, window: Arc<W>, shutdown: CancellationToken)
where
    W: PrimaryWindow + ?Sized + 'static,
{
    serve_with_idle_timeout(listener, window, shutdown, IDLE_TIMEOUT).await
}

async fn serve_with_idle_timeout<W>(
    mut listener: InstanceListener,
    window: Arc<W>,
    shutdown: CancellationToken,
    idle_timeout: Duration,
) where
    W: PrimaryWindow + ?Sized + 'static,
{
    let shared = Arc::new(Shared {
        window,
        recent: Mutex::new(RecentActivations::default()),
        shutdown: shutdown.clone(),
    });
    let mut connections = JoinSet::new();

    info!(event = "core.ipc.serve_started");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok(stream) => {
                        connections.spawn(handle_connection(stream, shared.clone(), idle_timeout));
                    }
                    Err(e) => {
                        warn!(event = "core.ipc.accept_failed", error = %e);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                }
            }
            // Reap finished connections so the set does not grow unbounded.
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = shutdown.cancelled() => break,
        }
    }

    let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while connections.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        warn!(
            event = "core.ipc.drain_timed_out",
            remaining = connections.len()
        );
        connections.abort_all();
    }

    info!(event = "core.ipc.serve_completed");
}

/// Handle a single launcher connection.
///
/// Reads JSONL requests, applies them to the window, and writes one response
/// per request. A malformed request gets an `invalid_request` error and the
/// connection is closed, as is a connection idle for `idle_timeout`.
async fn handle_connection<W>(stream: ServerStream, shared: Arc<Shared<W>>, idle_timeout: Duration)
where
    W: PrimaryWindow + ?Sized + 'static,
{
    debug!(event = "core.ipc.connection_accepted");

    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    loop {
        tokio::select! {
            result = tokio::time::timeout(idle_timeout, read_message::<_, ClientMessage>(&mut reader)) => {
                match result {
                    Err(_) => {
                        debug!(event = "core.ipc.connection_idle", idle_ms = idle_timeout.as_millis() as u64);
                        break;
                    }
                    Ok(Ok(Some(msg))) => {
                        let response = dispatch_blocking(msg, &shared).await;
                        if let Err(e) = write_message(&mut writer, &response).await {
                            error!(event = "core.ipc.write_failed", error = %e);
                            break;
                        }
                    }
                    Ok(Ok(None)) => {
                        debug!(event = "core.ipc.connection_closed");
                        break;
                    }
                    Ok(Err(e)) => {
                        warn!(event = "core.ipc.read_error", error = %e);
                        let response = InstanceMessage::Error {
                            id: String::new(),
                            code: "invalid_request".to_string(),
                            message: e.to_string(),
                        };
                        let _ = write_message(&mut writer, &response).await;
                        break;
                    }
                }
            }
            _ = shared.shutdown.cancelled() => {
                debug!(event = "core.ipc.connection_shutdown");
                break;
            }
        }
    }
}

/// Window calls may block, so they run off the async workers.
async fn dispatch_blocking<W>(msg: ClientMessage, shared: &Arc<Shared<W>>) -> InstanceMessage
where
    W: PrimaryWindow + ?Sized + 'static,
{
    let id = msg.id().to_string();
    let shared = shared.clone();

    match tokio::task::spawn_blocking(move || dispatch_message(msg, &shared)).await {
        Ok(response) => response,
        Err(e) => {
            error!(event = "core.ipc.dispatch_failed", error = %e);
            InstanceMessage::Error {
                id,
                code: "internal_error".to_string(),
                message: e.to_string(),
            }
        }
    }
}

fn dispatch_message<W>(msg: ClientMessage, shared: &Shared<W>) -> InstanceMessage
where
    W: PrimaryWindow + ?Sized,
{
    let window = shared.window.as_ref();

    match msg {
        ClientMessage::Ping { id } => InstanceMessage::Pong {
            id,
            pid: std::process::id(),
            title: window.title().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },

        ClientMessage::OpenLinks {
            id,
            activation,
            links,
        } => {
            // A launch retrying after a timeout resends the same activation.
            if !shared.recent().insert(&activation) {
                info!(event = "core.ipc.open_links_repeated", activation = activation);
                return InstanceMessage::Ack { id };
            }

            info!(event = "core.ipc.open_links_received", count = links.len());
            let result = window.open_links(links);
            if result.is_err() {
                shared.recent().forget(&activation);
            }
            respond(id, result)
        }

        ClientMessage::GetWindowState { id } => InstanceMessage::WindowState {
            id,
            state: window.show_state(),
            foreground: window.is_foreground(),
        },

        ClientMessage::ShowWindow { id, command } => {
            debug!(event = "core.ipc.show_window_received", command = ?command);
            respond(id, window.apply_show_command(command))
        }

        ClientMessage::FocusWindow { id } => respond(id, window.bring_to_foreground()),

        ClientMessage::Quit { id } => {
            info!(event = "core.ipc.quit_received");
            shared.shutdown.cancel();
            InstanceMessage::Ack { id }
        }
    }
}

fn respond<E: ShellError>(id: String, result: Result<(), E>) -> InstanceMessage {
    match result {
        Ok(()) => InstanceMessage::Ack { id },
        Err(e) => InstanceMessage::Error {
            id,
            code: e.error_code().to_string(),
            message: e.to_string(),
        },
    }
}

/// The channel served on a runtime of its own, for a primary whose event
/// loop is not tokio.
///
/// Starting it binds the endpoint, so it must only be started while the
/// identity claim is held.
pub struct ChannelServer {
    runtime: tokio::runtime::Runtime,
    task: tokio::task::JoinHandle<()>,
    shutdown: CancellationToken,
}

impl ChannelServer {
    pub fn start<W>(
        endpoint: &Endpoint,
        window: Arc<W>,
        shutdown: CancellationToken,
    ) -> Result<Self, IpcError>
    where
        W: PrimaryWindow + ?Sized + 'static,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("gopeed-ipc")
            .enable_all()
            .build()?;

        let listener = {
            let _guard = runtime.enter();
            InstanceListener::bind(endpoint)?
        };
        let task = runtime.spawn(serve(listener, window, shutdown.clone()));

        info!(event = "core.ipc.channel_started", endpoint = %endpoint);

        Ok(Self {
            runtime,
            task,
            shutdown,
        })
    }

    /// Stop serving and wait for open connections to drain.
    pub fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.runtime.block_on(self.task) {
            warn!(event = "core.ipc.channel_task_failed", error = %e);
        }
        info!(event = "core.ipc.channel_stopped");
    }
}
