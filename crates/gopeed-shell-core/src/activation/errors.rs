use crate::engine::EngineError;
use crate::errors::ShellError;
use crate::instance::ClaimError;
use crate::ipc::IpcError;
use crate::platform::PlatformError;
use crate::window::WindowError;

#[derive(Debug, thiserror::Error)]
pub enum ActivationError {
    #[error("Failed to deliver activation to '{endpoint}': {source}")]
    SignalDeliveryFailed {
        endpoint: String,
        #[source]
        source: IpcError,
    },

    #[error("Identity is claimed but no instance answered within {waited_ms}ms")]
    ClaimWaitElapsed { waited_ms: u64 },

    #[error(transparent)]
    ClaimFailed(#[from] ClaimError),

    #[error("Instance channel failed: {0}")]
    ChannelFailed(#[source] IpcError),

    #[error("Engine failed to start: {0}")]
    EngineStartFailed(#[from] EngineError),

    #[error("Window creation failed: {0}")]
    WindowCreationFailed(#[source] WindowError),

    #[error("Event loop failed: {0}")]
    EventLoopFailed(#[source] WindowError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl ShellError for ActivationError {
    fn error_code(&self) -> &'static str {
        match self {
            ActivationError::SignalDeliveryFailed { .. } => "SIGNAL_DELIVERY_FAILED",
            ActivationError::ClaimWaitElapsed { .. } => "CLAIM_WAIT_ELAPSED",
            ActivationError::ClaimFailed(_) => "CLAIM_FAILED",
            ActivationError::ChannelFailed(_) => "CHANNEL_FAILED",
            ActivationError::EngineStartFailed(_) => "ENGINE_START_FAILED",
            ActivationError::WindowCreationFailed(_) => "WINDOW_CREATION_FAILED",
            ActivationError::EventLoopFailed(_) => "EVENT_LOOP_FAILED",
            ActivationError::Platform(_) => "PLATFORM_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            ActivationError::EngineStartFailed(e) => e.is_user_error(),
            _ => false,
        }
    }
}
