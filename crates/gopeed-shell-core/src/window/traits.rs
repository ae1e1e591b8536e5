use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::activation::ActivationPayload;
use crate::window::errors::WindowError;
use crate::window::types::{ShowCommand, ShowState, WindowSpec};

/// The primary window as seen by the inter-instance channel.
///
/// Implemented by the GUI layer. Requests from later launches arrive on
/// the channel's IPC tasks, hence `Send + Sync`.
pub trait PrimaryWindow: Send + Sync {
    fn title(&self) -> &str;

    fn show_state(&self) -> ShowState;

    fn is_foreground(&self) -> bool;

    fn apply_show_command(&self, command: ShowCommand) -> Result<(), WindowError>;

    /// Move to the top of the z-order and take input focus.
    fn bring_to_foreground(&self) -> Result<(), WindowError>;

    /// Route links forwarded by a later launch into deep-link handling.
    fn open_links(&self, links: Vec<String>) -> Result<(), WindowError>;
}

/// Creates the primary window and drives its event loop.
pub trait WindowHost {
    type Window: PrimaryWindow + 'static;

    /// Create the primary window, handing it the launch's activation arguments.
    fn create_window(
        &self,
        spec: &WindowSpec,
        startup_args: ActivationPayload,
    ) -> Result<Arc<Self::Window>, WindowError>;

    /// Run until `shutdown` is cancelled.
    ///
    /// A quit request from a later launch cancels `shutdown`. The host
    /// cancels it too when the window is closed or the process is signalled.
    fn run_event_loop(
        &self,
        window: Arc<Self::Window>,
        shutdown: &CancellationToken,
    ) -> Result<(), WindowError>;
}
