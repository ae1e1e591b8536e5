//! Single-instance activation.
//!
//! A launch either hands its arguments to the running instance and exits,
//! or claims the instance identity and becomes the primary.

pub mod channel;
pub mod coordinator;
pub mod errors;
pub mod primary;
pub mod types;

pub use channel::{InstanceChannel, IpcChannel};
pub use coordinator::ActivationCoordinator;
pub use errors::ActivationError;
pub use primary::Bootstrap;
pub use types::{ActivationPayload, ForwardReport, LaunchOutcome, LaunchState, Resolution};
