use crate::errors::ShellError;

#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("No instance is listening")]
    NotRunning,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Instance rejected request: [{code}] {message}")]
    Rejected { code: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError for IpcError {
    fn error_code(&self) -> &'static str {
        match self {
            IpcError::NotRunning => "IPC_NOT_RUNNING",
            IpcError::ConnectionFailed(_) => "IPC_CONNECTION_FAILED",
            IpcError::Timeout { .. } => "IPC_TIMEOUT",
            IpcError::ProtocolError(_) => "IPC_PROTOCOL_ERROR",
            IpcError::Rejected { .. } => "IPC_REJECTED",
            IpcError::Io(_) => "IPC_IO_ERROR",
        }
    }
}
