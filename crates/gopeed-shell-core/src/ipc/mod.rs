//! Channel between a new launch and the primary instance.
//!
//! The launch side is a short-lived blocking client. The primary serves the
//! channel from the moment it holds the identity claim until it exits.

pub mod client;
pub mod codec;
pub mod errors;
pub mod messages;
pub mod server;
pub mod transport;

pub use client::{InstanceClient, InstanceStatus, WindowStatus};
pub use errors::IpcError;
pub use messages::{ClientMessage, InstanceMessage};
pub use server::{ChannelServer, serve};
pub use transport::InstanceListener;
