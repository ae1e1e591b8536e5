//! Default implementations for configuration types.
//!
//! This module contains all `Default` implementations and helper functions
//! for providing default values in serde deserialization.

use crate::config::types::{EngineConfig, InstanceConfig, IpcConfig, WindowConfig};

/// Title of the primary window, shared by every launch of the app.
pub const DEFAULT_TITLE: &str = "gopeed";

/// Window class registered by the desktop runner.
pub const DEFAULT_WINDOW_CLASS: &str = "FLUTTER_RUNNER_WIN32_WINDOW";

pub fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

pub fn default_window_class() -> String {
    DEFAULT_WINDOW_CLASS.to_string()
}

/// Returns the default IPC request timeout (2000ms).
///
/// A healthy instance answers in well under a millisecond; the bound only
/// matters when the running instance is wedged.
pub fn default_request_timeout_ms() -> u64 {
    2000
}

/// Returns the default number of delivery retries (1).
pub fn default_delivery_retries() -> u32 {
    1
}

/// Returns the default claim wait (3000ms).
pub fn default_claim_wait_ms() -> u64 {
    3000
}

pub fn default_window_x() -> i32 {
    10
}

pub fn default_window_y() -> i32 {
    10
}

pub fn default_window_width() -> u32 {
    1280
}

pub fn default_window_height() -> u32 {
    720
}

/// Returns the default engine start config: an empty JSON object.
pub fn default_start_config() -> String {
    "{}".to_string()
}

/// Returns the default engine start timeout (10000ms).
pub fn default_start_timeout_ms() -> u64 {
    10_000
}

/// Returns the default engine stop grace period (3000ms).
pub fn default_stop_timeout_ms() -> u64 {
    3000
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            window_class: default_window_class(),
            runtime_dir: None,
        }
    }
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            delivery_retries: default_delivery_retries(),
            claim_wait_ms: default_claim_wait_ms(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            x: default_window_x(),
            y: default_window_y(),
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            start_config: default_start_config(),
            start_timeout_ms: default_start_timeout_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ShellConfig;

    #[test]
    fn test_serde_defaults_match_default_impl() {
        let parsed: ShellConfig = toml::from_str("").unwrap();
        assert_eq!(parsed, ShellConfig::default());
    }

    #[test]
    fn test_default_window_geometry() {
        let config = ShellConfig::default();
        assert_eq!(config.window.x, 10);
        assert_eq!(config.window.y, 10);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.instance.title, "gopeed");
    }

    #[test]
    fn test_default_timeouts() {
        let config = ShellConfig::default();
        assert_eq!(config.ipc.request_timeout_ms, 2000);
        assert_eq!(config.ipc.claim_wait_ms, 3000);
        assert_eq!(config.engine.start_timeout_ms, 10_000);
        assert_eq!(config.engine.stop_timeout_ms, 3000);
    }
}
