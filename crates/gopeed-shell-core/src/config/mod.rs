//! # Configuration System
//!
//! Hierarchical TOML configuration for the desktop shell.
//!
//! ## Configuration Hierarchy
//!
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.gopeed/shell.toml`
//! 3. **Explicit config** - `gopeed-shell --config <PATH>`
//!
//! ## Loading Configuration
//!
//! ```rust,no_run
//! use gopeed_shell_core::config::ShellConfig;
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ShellConfig::load_hierarchy(None)?;
//!     let runtime_dir = config.runtime_dir();
//!     println!("{}", runtime_dir.display());
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use types::{EngineConfig, InstanceConfig, IpcConfig, ShellConfig, WindowConfig};
pub use validation::validate_config;

use crate::errors::ConfigError;
use crate::instance::InstanceIdentity;
use crate::window::WindowSpec;

impl ShellConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        loading::load_hierarchy(explicit)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }

    pub fn runtime_dir(&self) -> PathBuf {
        loading::resolve_runtime_dir(self)
    }

    pub fn identity(&self) -> InstanceIdentity {
        InstanceIdentity::new(&self.instance.title, &self.instance.window_class)
    }

    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec::new(
            &self.instance.title,
            (self.window.x, self.window.y),
            (self.window.width, self.window.height),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc.request_timeout_ms)
    }

    pub fn claim_wait(&self) -> Duration {
        Duration::from_millis(self.ipc.claim_wait_ms)
    }
}
