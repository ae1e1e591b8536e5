//! gopeed-shell-core: single-instance launch and deep-link hand-off for the
//! Gopeed desktop shell
//!
//! Every launch of the shell goes through an [`ActivationCoordinator`]. If
//! an instance is already running, the launch arguments are forwarded to it
//! over a local IPC channel and its window is restored and brought to the
//! front. Otherwise the launch claims the instance identity, starts the
//! download engine, and runs the primary window.
//!
//! # Main Entry Points
//!
//! - [`activation`] - Resolve a launch, run the primary instance
//! - [`instance`] - Instance identity, locator, and identity claim
//! - [`ipc`] - JSONL channel between launches and the primary
//! - [`engine`] - Download engine boundary
//! - [`window`] - Primary window boundary and the headless host
//! - [`config`] - Configuration management

pub mod activation;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod instance;
pub mod ipc;
pub mod logging;
pub mod platform;
pub mod window;

// Re-export commonly used types at crate root for convenience
pub use activation::{
    ActivationCoordinator, ActivationError, ActivationPayload, Bootstrap, IpcChannel,
    LaunchOutcome, Resolution,
};
pub use config::ShellConfig;
pub use engine::{Engine, EngineError, EngineHandle, EngineSession, ProcessEngine};
pub use errors::{ShellError, ShellResult};
pub use instance::{InstanceIdentity, InstanceLocator, InstanceRef, IpcLocator, LockClaimer};
pub use platform::NativePlatform;
pub use window::{HeadlessHost, PrimaryWindow, ShowCommand, ShowState, WindowHost, WindowSpec};

// Re-export logging initialization
pub use logging::init_logging;
