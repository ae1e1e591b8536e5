use crate::errors::ShellError;

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("Failed to create window: {message}")]
    CreationFailed { message: String },

    #[error("Event loop failed: {message}")]
    EventLoopFailed { message: String },

    #[error("Window operation failed: {message}")]
    OperationFailed { message: String },
}

impl ShellError for WindowError {
    fn error_code(&self) -> &'static str {
        match self {
            WindowError::CreationFailed { .. } => "WINDOW_CREATION_FAILED",
            WindowError::EventLoopFailed { .. } => "WINDOW_EVENT_LOOP_FAILED",
            WindowError::OperationFailed { .. } => "WINDOW_OPERATION_FAILED",
        }
    }
}
