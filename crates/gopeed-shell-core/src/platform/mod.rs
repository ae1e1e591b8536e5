//! Process-wide platform setup for the primary instance.

pub mod errors;
#[cfg(windows)]
mod win32;

pub use errors::PlatformError;

/// Process-wide setup the primary needs before it creates its window.
pub trait Platform {
    /// Released when dropped.
    type Context;

    /// Attach to the parent console so logs are visible when launched from
    /// a terminal, or open one when running under a debugger.
    fn prepare_console(&self);

    fn enter_subsystem(&self) -> Result<Self::Context, PlatformError>;
}

/// The platform the shell was built for.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativePlatform;

#[cfg(windows)]
pub use self::win32::ComContext as SubsystemContext;

#[cfg(not(windows))]
#[derive(Debug)]
pub struct SubsystemContext;

impl Platform for NativePlatform {
    type Context = SubsystemContext;

    #[cfg(windows)]
    fn prepare_console(&self) {
        self::win32::attach_console();
    }

    #[cfg(not(windows))]
    fn prepare_console(&self) {}

    #[cfg(windows)]
    fn enter_subsystem(&self) -> Result<SubsystemContext, PlatformError> {
        self::win32::ComContext::enter()
    }

    #[cfg(not(windows))]
    fn enter_subsystem(&self) -> Result<SubsystemContext, PlatformError> {
        Ok(SubsystemContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_subsystem_enters_and_releases() {
        let platform = NativePlatform;
        platform.prepare_console();
        let context = platform.enter_subsystem().unwrap();
        drop(context);
    }
}
