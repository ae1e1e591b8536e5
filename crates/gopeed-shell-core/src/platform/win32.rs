use tracing::{debug, warn};
use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{COINIT_APARTMENTTHREADED, CoInitializeEx, CoUninitialize};
use windows::Win32::System::Console::{ATTACH_PARENT_PROCESS, AllocConsole, AttachConsole};
use windows::Win32::System::Diagnostics::Debug::IsDebuggerPresent;

use crate::platform::errors::PlatformError;

pub(super) fn attach_console() {
    // SAFETY: plain Win32 calls without pointer arguments.
    unsafe {
        if AttachConsole(ATTACH_PARENT_PROCESS).is_ok() {
            debug!(event = "core.platform.console_attached");
            return;
        }

        if IsDebuggerPresent().as_bool() {
            match AllocConsole() {
                Ok(()) => debug!(event = "core.platform.console_allocated"),
                Err(e) => warn!(event = "core.platform.console_alloc_failed", error = %e),
            }
        }
    }
}

/// COM initialized on the current thread. Uninitialized on drop.
#[derive(Debug)]
pub struct ComContext {
    initialized: bool,
}

impl ComContext {
    pub(super) fn enter() -> Result<Self, PlatformError> {
        // SAFETY: called on the thread that runs the window, before any COM use.
        match unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) } {
            Ok(()) => {
                debug!(event = "core.platform.com_initialized");
                Ok(Self { initialized: true })
            }
            // Someone already initialized COM with another model. Usable, but not ours to release.
            Err(e) if e.code() == RPC_E_CHANGED_MODE => {
                warn!(event = "core.platform.com_mode_mismatch", error = %e);
                Ok(Self { initialized: false })
            }
            Err(e) => Err(PlatformError::SubsystemInit {
                message: e.to_string(),
            }),
        }
    }
}

impl Drop for ComContext {
    fn drop(&mut self) {
        if self.initialized {
            // SAFETY: balances the successful CoInitializeEx on this thread.
            unsafe { CoUninitialize() };
            debug!(event = "core.platform.com_uninitialized");
        }
    }
}
