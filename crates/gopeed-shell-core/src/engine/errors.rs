use crate::errors::ShellError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No engine command configured (set [engine] command)")]
    NotConfigured,

    #[error("Failed to spawn engine '{command}': {message}")]
    SpawnFailed { command: String, message: String },

    #[error("Engine failed to start: {message}")]
    StartFailed { message: String },

    #[error("Engine did not report readiness within {timeout_ms}ms")]
    StartTimedOut { timeout_ms: u64 },

    #[error("Engine returned invalid handle {handle}")]
    InvalidHandle { handle: i64 },

    #[error("Engine protocol error: {message}")]
    Protocol { message: String },

    #[error("Engine is already started")]
    AlreadyStarted,
}

impl ShellError for EngineError {
    fn error_code(&self) -> &'static str {
        match self {
            EngineError::NotConfigured => "ENGINE_NOT_CONFIGURED",
            EngineError::SpawnFailed { .. } => "ENGINE_SPAWN_FAILED",
            EngineError::StartFailed { .. } => "ENGINE_START_FAILED",
            EngineError::StartTimedOut { .. } => "ENGINE_START_TIMED_OUT",
            EngineError::InvalidHandle { .. } => "ENGINE_INVALID_HANDLE",
            EngineError::Protocol { .. } => "ENGINE_PROTOCOL_ERROR",
            EngineError::AlreadyStarted => "ENGINE_ALREADY_STARTED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, EngineError::NotConfigured)
    }
}
