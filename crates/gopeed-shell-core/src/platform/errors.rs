use crate::errors::ShellError;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Failed to initialize platform subsystem: {message}")]
    SubsystemInit { message: String },
}

impl ShellError for PlatformError {
    fn error_code(&self) -> &'static str {
        match self {
            PlatformError::SubsystemInit { .. } => "PLATFORM_SUBSYSTEM_INIT",
        }
    }
}
