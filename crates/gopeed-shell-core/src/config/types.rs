//! Configuration type definitions for the desktop shell.
//!
//! These types are deserialized from TOML config files.
//!
//! # Example Configuration
//!
//! ```toml
//! [instance]
//! title = "gopeed"
//! runtime_dir = "/run/user/1000/gopeed"
//!
//! [ipc]
//! request_timeout_ms = 2000
//! delivery_retries = 1
//!
//! [window]
//! width = 1280
//! height = 720
//!
//! [engine]
//! command = "/opt/gopeed/gopeed-engine"
//! start_config = '{"network":"tcp","address":"127.0.0.1:0"}'
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::defaults;

/// Main configuration loaded from TOML config files.
///
/// Loaded from built-in defaults, then `~/.gopeed/shell.toml`, then an
/// explicit `--config` file. Later layers override earlier ones.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ShellConfig {
    /// Identity of the single running instance
    #[serde(default)]
    pub instance: InstanceConfig,

    /// Inter-instance channel settings
    #[serde(default)]
    pub ipc: IpcConfig,

    /// Primary window geometry
    #[serde(default)]
    pub window: WindowConfig,

    /// Download engine boundary
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstanceConfig {
    /// Display title that identifies the one running instance
    #[serde(default = "defaults::default_title")]
    pub title: String,

    /// Native window class of the primary window
    #[serde(default = "defaults::default_window_class")]
    pub window_class: String,

    /// Directory holding the instance socket and lock file.
    /// Falls back to the platform runtime dir when unset.
    #[serde(default)]
    pub runtime_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IpcConfig {
    /// Bound for every request sent to the running instance
    #[serde(default = "defaults::default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// How many times a failed delivery is retried after a fresh lookup
    #[serde(default = "defaults::default_delivery_retries")]
    pub delivery_retries: u32,

    /// How long a launch that lost the identity claim waits for the winner to answer
    #[serde(default = "defaults::default_claim_wait_ms")]
    pub claim_wait_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowConfig {
    #[serde(default = "defaults::default_window_x")]
    pub x: i32,
    #[serde(default = "defaults::default_window_y")]
    pub y: i32,
    #[serde(default = "defaults::default_window_width")]
    pub width: u32,
    #[serde(default = "defaults::default_window_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Engine executable. No engine can be started without it.
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Opaque start configuration handed to the engine
    #[serde(default = "defaults::default_start_config")]
    pub start_config: String,

    /// How long the engine has to report its handle
    #[serde(default = "defaults::default_start_timeout_ms")]
    pub start_timeout_ms: u64,

    /// How long the engine has to exit after stdin closes before it is killed
    #[serde(default = "defaults::default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}
