use std::io::{BufReader, Read, Write};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::instance::Endpoint;
use crate::ipc::codec;
use crate::ipc::errors::IpcError;
use crate::ipc::messages::{ClientMessage, InstanceMessage};
use crate::ipc::transport::{self, ClientStream};
use crate::window::{ShowCommand, ShowState};

/// What a running instance reports about itself in answer to `ping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceStatus {
    pub pid: u32,
    pub title: String,
    pub version: String,
}

/// Window state reported by a running instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowStatus {
    pub state: ShowState,
    pub foreground: bool,
}

/// Blocking client for the channel served by the primary instance.
///
/// Every request is bounded by the timeout given at connect time. Unix
/// sockets carry the timeout themselves. A named pipe has none, so on
/// Windows each request runs on a worker thread that is abandoned, along
/// with the connection, once the timeout passes.
#[derive(Debug)]
pub struct InstanceClient {
    /// `None` after a request timed out on a worker thread.
    reader: Option<BufReader<ClientStream>>,
    timeout: Duration,
}

impl InstanceClient {
    pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<Self, IpcError> {
        let stream = transport::connect(endpoint, timeout)?;

        debug!(event = "core.ipc.client_connected", endpoint = %endpoint);

        Ok(Self::from_stream(stream, timeout))
    }

    fn from_stream(stream: ClientStream, timeout: Duration) -> Self {
        Self {
            reader: Some(BufReader::new(stream)),
            timeout,
        }
    }

    fn next_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Send a request and read its response.
    fn request(&mut self, msg: &ClientMessage) -> Result<InstanceMessage, IpcError> {
        let line = codec::encode(msg)?;

        let reply = self.exchange(line).map_err(|e| self.classify(e))?;
        let response: InstanceMessage = codec::decode(&reply)?;

        if response.id() != msg.id() {
            return Err(IpcError::ProtocolError(format!(
                "response id '{}' does not match request id '{}'",
                response.id(),
                msg.id()
            )));
        }

        Self::check_error(&response)?;
        Ok(response)
    }

    fn take_reader(&mut self) -> Result<BufReader<ClientStream>, IpcError> {
        self.reader.take().ok_or_else(|| {
            IpcError::ConnectionFailed("connection abandoned after a timed-out request".to_string())
        })
    }

    #[cfg(unix)]
    fn exchange(&mut self, line: String) -> Result<String, IpcError> {
        let mut reader = self.take_reader()?;
        let reply = round_trip(&mut reader, &line);
        self.reader = Some(reader);
        reply
    }

    #[cfg(windows)]
    fn exchange(&mut self, line: String) -> Result<String, IpcError> {
        let reader = self.take_reader()?;
        let (reader, reply) = round_trip_within(reader, line, self.timeout);
        self.reader = reader;
        reply
    }

    fn classify(&self, err: IpcError) -> IpcError {
        match err {
            IpcError::Io(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                IpcError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }
            }
            other => other,
        }
    }

    /// Check if a response is an error, and if so, convert it.
    fn check_error(response: &InstanceMessage) -> Result<(), IpcError> {
        if let InstanceMessage::Error { code, message, .. } = response {
            return Err(IpcError::Rejected {
                code: code.clone(),
                message: message.clone(),
            });
        }
        Ok(())
    }

    fn expect_ack(response: InstanceMessage) -> Result<(), IpcError> {
        match response {
            InstanceMessage::Ack { .. } => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    pub fn ping(&mut self) -> Result<InstanceStatus, IpcError> {
        let msg = ClientMessage::Ping {
            id: Self::next_id(),
        };

        match self.request(&msg)? {
            InstanceMessage::Pong {
                pid,
                title,
                version,
                ..
            } => Ok(InstanceStatus {
                pid,
                title,
                version,
            }),
            other => Err(unexpected(&other)),
        }
    }

    /// Hand activation arguments to the running instance.
    ///
    /// Retries of one launch must pass the same `activation`.
    pub fn open_links(&mut self, activation: &str, links: &[String]) -> Result<(), IpcError> {
        let msg = ClientMessage::OpenLinks {
            id: Self::next_id(),
            activation: activation.to_string(),
            links: links.to_vec(),
        };
        let response = self.request(&msg)?;
        Self::expect_ack(response)
    }

    pub fn window_state(&mut self) -> Result<WindowStatus, IpcError> {
        let msg = ClientMessage::GetWindowState {
            id: Self::next_id(),
        };

        match self.request(&msg)? {
            InstanceMessage::WindowState {
                state, foreground, ..
            } => Ok(WindowStatus { state, foreground }),
            other => Err(unexpected(&other)),
        }
    }

    pub fn show_window(&mut self, command: ShowCommand) -> Result<(), IpcError> {
        let msg = ClientMessage::ShowWindow {
            id: Self::next_id(),
            command,
        };
        let response = self.request(&msg)?;
        Self::expect_ack(response)
    }

    pub fn focus_window(&mut self) -> Result<(), IpcError> {
        let msg = ClientMessage::FocusWindow {
            id: Self::next_id(),
        };
        let response = self.request(&msg)?;
        Self::expect_ack(response)
    }

    /// Ask the running instance to exit its event loop.
    pub fn quit(&mut self) -> Result<(), IpcError> {
        let msg = ClientMessage::Quit {
            id: Self::next_id(),
        };
        let response = self.request(&msg)?;
        Self::expect_ack(response)
    }
}

fn unexpected(response: &InstanceMessage) -> IpcError {
    IpcError::ProtocolError(format!("unexpected response: {:?}", response))
}

/// Write one request line and read one reply line.
fn round_trip<S: Read + Write>(reader: &mut BufReader<S>, line: &str) -> Result<String, IpcError> {
    let stream = reader.get_mut();
    stream.write_all(line.as_bytes())?;
    stream.flush()?;

    codec::read_line(reader)?
        .ok_or_else(|| IpcError::ConnectionFailed("connection closed".to_string()))
}

/// [`round_trip`] on a worker thread, given up after `timeout`.
///
/// The stream comes back only if the worker finished in time.
#[cfg(any(windows, test))]
fn round_trip_within<S>(
    reader: BufReader<S>,
    line: String,
    timeout: Duration,
) -> (Option<BufReader<S>>, Result<String, IpcError>)
where
    S: Read + Write + Send + 'static,
{
    use std::sync::mpsc::{self, RecvTimeoutError};

    let (done_tx, done_rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut reader = reader;
        let reply = round_trip(&mut reader, &line);
        let _ = done_tx.send((reader, reply));
    });

    match done_rx.recv_timeout(timeout) {
        Ok((reader, reply)) => (Some(reader), reply),
        Err(RecvTimeoutError::Timeout) => {
            debug!(event = "core.ipc.request_abandoned", timeout_ms = timeout.as_millis() as u64);
            (
                None,
                Err(IpcError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                }),
            )
        }
        Err(RecvTimeoutError::Disconnected) => (
            None,
            Err(IpcError::ConnectionFailed("request worker exited".to_string())),
        ),
    }
}
