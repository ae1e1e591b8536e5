use serde::{Deserialize, Serialize};

use crate::window::errors::WindowError;

/// Show state of a top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowState {
    Normal,
    Minimized,
    Maximized,
}

/// Command that changes a window's show state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowCommand {
    ShowNormal,
    ShowMaximized,
    Restore,
    Minimize,
}

impl ShowCommand {
    /// Command that brings a window forward without changing its layout.
    ///
    /// Maximized stays maximized and normal stays normal. Minimized is
    /// restored, never left minimized.
    pub fn reassert(state: ShowState) -> Self {
        match state {
            ShowState::Maximized => ShowCommand::ShowMaximized,
            ShowState::Minimized => ShowCommand::Restore,
            ShowState::Normal => ShowCommand::ShowNormal,
        }
    }
}

impl ShowState {
    /// State a window ends up in after `command`.
    pub fn apply(self, command: ShowCommand) -> ShowState {
        match command {
            ShowCommand::ShowMaximized => ShowState::Maximized,
            ShowCommand::ShowNormal | ShowCommand::Restore => ShowState::Normal,
            ShowCommand::Minimize => ShowState::Minimized,
        }
    }
}

/// Title and geometry of the primary window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub title: String,
    pub origin: (i32, i32),
    pub size: (u32, u32),
}

impl WindowSpec {
    pub fn new(title: &str, origin: (i32, i32), size: (u32, u32)) -> Self {
        Self {
            title: title.to_string(),
            origin,
            size,
        }
    }

    /// Reject a spec no host could create a window for.
    pub fn validate(&self) -> Result<(), WindowError> {
        if self.title.trim().is_empty() {
            return Err(WindowError::CreationFailed {
                message: "window title is empty".to_string(),
            });
        }

        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(WindowError::CreationFailed {
                message: format!(
                    "window size {}x{} has no area",
                    self.size.0, self.size.1
                ),
            });
        }

        Ok(())
    }
}
