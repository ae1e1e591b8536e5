use serde::{Deserialize, Serialize};

use crate::window::{ShowCommand, ShowState};

/// Launcher -> running instance request messages.
///
/// Each variant maps to a JSONL message with `"type"` as the tag field.
/// All requests carry an `id` that the response echoes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Liveness check. Answered with `pong`.
    #[serde(rename = "ping")]
    Ping { id: String },

    /// Hand the activation arguments of a new launch to the running instance.
    ///
    /// `activation` stays the same on every attempt one launch makes, so a
    /// repeated delivery is recognized and not handed over twice.
    #[serde(rename = "open_links")]
    OpenLinks {
        id: String,
        activation: String,
        links: Vec<String>,
    },

    #[serde(rename = "get_window_state")]
    GetWindowState { id: String },

    #[serde(rename = "show_window")]
    ShowWindow { id: String, command: ShowCommand },

    /// Raise the window to the top of the z-order and give it input focus.
    #[serde(rename = "focus_window")]
    FocusWindow { id: String },

    /// Ask the running instance to leave its event loop.
    #[serde(rename = "quit")]
    Quit { id: String },
}

impl ClientMessage {
    pub fn id(&self) -> &str {
        match self {
            ClientMessage::Ping { id }
            | ClientMessage::OpenLinks { id, .. }
            | ClientMessage::GetWindowState { id }
            | ClientMessage::ShowWindow { id, .. }
            | ClientMessage::FocusWindow { id }
            | ClientMessage::Quit { id } => id,
        }
    }
}

/// Running instance -> launcher response messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InstanceMessage {
    #[serde(rename = "pong")]
    Pong {
        id: String,
        pid: u32,
        title: String,
        version: String,
    },

    #[serde(rename = "window_state")]
    WindowState {
        id: String,
        state: ShowState,
        foreground: bool,
    },

    #[serde(rename = "ack")]
    Ack { id: String },

    #[serde(rename = "error")]
    Error {
        id: String,
        code: String,
        message: String,
    },
}

impl InstanceMessage {
    pub fn id(&self) -> &str {
        match self {
            InstanceMessage::Pong { id, .. }
            | InstanceMessage::WindowState { id, .. }
            | InstanceMessage::Ack { id }
            | InstanceMessage::Error { id, .. } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_links_wire_format() {
        let msg = ClientMessage::OpenLinks {
            id: "req-1".to_string(),
            activation: "act-1".to_string(),
            links: vec!["gopeed://magnet?xt=abc".to_string()],
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "open_links");
        assert_eq!(json["id"], "req-1");
        assert_eq!(json["activation"], "act-1");
        assert_eq!(json["links"][0], "gopeed://magnet?xt=abc");
    }

    #[test]
    fn test_show_window_command_is_snake_case() {
        let msg = ClientMessage::ShowWindow {
            id: "req-2".to_string(),
            command: ShowCommand::ShowMaximized,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""command":"show_maximized""#), "got: {}", json);
    }

    #[test]
    fn test_parse_window_state_response() {
        let msg: InstanceMessage = serde_json::from_str(
            r#"{"type":"window_state","id":"req-3","state":"minimized","foreground":false}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            InstanceMessage::WindowState {
                id: "req-3".to_string(),
                state: ShowState::Minimized,
                foreground: false,
            }
        );
        assert_eq!(msg.id(), "req-3");
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type":"format_disk","id":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_links_requires_links_and_activation() {
        let no_links: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type":"open_links","id":"x","activation":"a"}"#);
        assert!(no_links.is_err());

        let no_activation: Result<ClientMessage, _> =
            serde_json::from_str(r#"{"type":"open_links","id":"x","links":[]}"#);
        assert!(no_activation.is_err());
    }
}
