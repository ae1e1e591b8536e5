use std::time::Duration;

use crate::instance::InstanceRef;
use crate::ipc::{InstanceClient, IpcError};
use crate::window::{ShowCommand, ShowState};

/// Requests a launch can make of the running instance.
pub trait InstanceChannel {
    /// Hand `links` over. Every attempt of one launch passes the same
    /// `activation`, so the target opens the links at most once.
    fn deliver(&self, target: &InstanceRef, activation: &str, links: &[String])
    -> Result<(), IpcError>;

    fn show_state(&self, target: &InstanceRef) -> Result<ShowState, IpcError>;

    fn show(&self, target: &InstanceRef, command: ShowCommand) -> Result<(), IpcError>;

    fn bring_to_foreground(&self, target: &InstanceRef) -> Result<(), IpcError>;
}

/// [`InstanceChannel`] over the instance's IPC endpoint, one connection per request.
#[derive(Debug, Clone)]
pub struct IpcChannel {
    timeout: Duration,
}

impl IpcChannel {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn client(&self, target: &InstanceRef) -> Result<InstanceClient, IpcError> {
        InstanceClient::connect(&target.endpoint, self.timeout)
    }
}

impl InstanceChannel for IpcChannel {
    fn deliver(
        &self,
        target: &InstanceRef,
        activation: &str,
        links: &[String],
    ) -> Result<(), IpcError> {
        self.client(target)?.open_links(activation, links)
    }

    fn show_state(&self, target: &InstanceRef) -> Result<ShowState, IpcError> {
        Ok(self.client(target)?.window_state()?.state)
    }

    fn show(&self, target: &InstanceRef, command: ShowCommand) -> Result<(), IpcError> {
        self.client(target)?.show_window(command)
    }

    fn bring_to_foreground(&self, target: &InstanceRef) -> Result<(), IpcError> {
        self.client(target)?.focus_window()
    }
}
