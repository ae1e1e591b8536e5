//! Platform endpoints for the inter-instance channel.
//!
//! Unix uses a domain socket inside the runtime directory. Windows uses a
//! named pipe. The launcher side is blocking; the primary side is tokio.

use std::time::Duration;

use tracing::debug;

use crate::instance::Endpoint;
use crate::ipc::errors::IpcError;

#[cfg(unix)]
pub type ClientStream = std::os::unix::net::UnixStream;

#[cfg(windows)]
pub type ClientStream = std::fs::File;

#[cfg(unix)]
pub type ServerStream = tokio::net::UnixStream;

#[cfg(windows)]
pub type ServerStream = tokio::net::windows::named_pipe::NamedPipeServer;

/// Open a blocking connection to the instance serving `endpoint`.
///
/// A missing endpoint or a refused connection means no instance is running.
#[cfg(unix)]
pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<ClientStream, IpcError> {
    let path = endpoint.socket_path();
    let stream = ClientStream::connect(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused => {
            IpcError::NotRunning
        }
        _ => IpcError::ConnectionFailed(format!("{}: {}", path.display(), e)),
    })?;

    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    Ok(stream)
}

/// Open a blocking connection to the instance serving `endpoint`.
///
/// Retries while every pipe instance is busy, up to `timeout`.
#[cfg(windows)]
pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<ClientStream, IpcError> {
    use std::time::Instant;

    const ERROR_PIPE_BUSY: i32 = 231;

    let name = endpoint.pipe_name();
    let started = Instant::now();

    loop {
        match std::fs::OpenOptions::new().read(true).write(true).open(&name) {
            Ok(file) => return Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(IpcError::NotRunning);
            }
            Err(e) if e.raw_os_error() == Some(ERROR_PIPE_BUSY) => {
                if started.elapsed() >= timeout {
                    return Err(IpcError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => {
                return Err(IpcError::ConnectionFailed(format!("{}: {}", name, e)));
            }
        }
    }
}

/// Listening side of the channel, owned by the primary instance.
///
/// Must be bound inside a tokio runtime, and only while the identity claim
/// is held.
#[cfg(unix)]
pub struct InstanceListener {
    listener: tokio::net::UnixListener,
    path: std::path::PathBuf,
}

#[cfg(unix)]
impl InstanceListener {
    pub fn bind(endpoint: &Endpoint) -> Result<Self, IpcError> {
        let path = endpoint.socket_path();

        // The claim is ours, so any socket file left here belongs to a dead instance.
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(
                event = "core.ipc.stale_socket_removed",
                path = %path.display()
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(IpcError::Io(e)),
        }

        let listener = tokio::net::UnixListener::bind(&path)?;
        debug!(event = "core.ipc.listener_bound", path = %path.display());

        Ok(Self { listener, path })
    }

    pub async fn accept(&mut self) -> Result<ServerStream, IpcError> {
        let (stream, _) = self.listener.accept().await?;
        Ok(stream)
    }
}

#[cfg(unix)]
impl Drop for InstanceListener {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            debug!(
                event = "core.ipc.socket_cleanup_failed",
                path = %self.path.display(),
                error = %e
            );
        }
    }
}

#[cfg(windows)]
pub struct InstanceListener {
    name: String,
    pending: ServerStream,
}

#[cfg(windows)]
impl InstanceListener {
    pub fn bind(endpoint: &Endpoint) -> Result<Self, IpcError> {
        use tokio::net::windows::named_pipe::ServerOptions;

        let name = endpoint.pipe_name();
        let pending = ServerOptions::new()
            .first_pipe_instance(true)
            .create(&name)?;
        debug!(event = "core.ipc.listener_bound", pipe = name);

        Ok(Self { name, pending })
    }

    /// Wait for a client, then put a fresh pipe instance in place for the next one.
    pub async fn accept(&mut self) -> Result<ServerStream, IpcError> {
        use tokio::net::windows::named_pipe::ServerOptions;

        self.pending.connect().await?;
        let next = ServerOptions::new().create(&self.name)?;
        Ok(std::mem::replace(&mut self.pending, next))
    }
}
