use serde::Serialize;

use crate::instance::InstanceRef;
use crate::window::{ShowCommand, ShowState};

/// Arguments this launch was started with, program name excluded.
///
/// Handed off exactly once: forwarded to the running instance, or given
/// to the primary window as its startup arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationPayload(Vec<String>);

impl ActivationPayload {
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(args.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Start,
    Forwarding,
    Primary,
}

impl LaunchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LaunchState::Start => "start",
            LaunchState::Forwarding => "forwarding",
            LaunchState::Primary => "primary",
        }
    }
}

/// Which forwarding steps reached the running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardReport {
    #[serde(skip)]
    pub target: InstanceRef,
    pub pid: Option<u32>,
    pub links_delivered: usize,
    pub previous_state: Option<ShowState>,
    pub applied: Option<ShowCommand>,
    pub foreground: bool,
}

/// How a launch resolved against the instance identity.
#[derive(Debug)]
pub enum Resolution<C> {
    /// The running instance took the payload. This launch is done.
    Forwarded(ForwardReport),

    /// No instance is running and this launch now holds the identity.
    Primary { claim: C, payload: ActivationPayload },

    /// An instance holds the identity but could not be activated.
    Unresponsive {
        target: Option<InstanceRef>,
        error: crate::activation::ActivationError,
    },
}

impl<C> Resolution<C> {
    pub fn state(&self) -> LaunchState {
        match self {
            Resolution::Primary { .. } => LaunchState::Primary,
            Resolution::Forwarded(_) | Resolution::Unresponsive { .. } => LaunchState::Forwarding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    Forwarded,
    PrimaryExited,
    InstanceUnresponsive,
}

impl LaunchOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchOutcome::Forwarded | LaunchOutcome::PrimaryExited => 0,
            LaunchOutcome::InstanceUnresponsive => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_keeps_order() {
        let payload = ActivationPayload::from_args(["b", "a", "gopeed://x"]);
        assert_eq!(payload.len(), 3);
        assert_eq!(payload.as_slice()[2], "gopeed://x");
        assert_eq!(
            payload.into_vec(),
            vec!["b".to_string(), "a".to_string(), "gopeed://x".to_string()]
        );
    }

    #[test]
    fn test_empty_payload() {
        assert!(ActivationPayload::default().is_empty());
        assert!(ActivationPayload::from_args(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(LaunchOutcome::Forwarded.exit_code(), 0);
        assert_eq!(LaunchOutcome::PrimaryExited.exit_code(), 0);
        assert_eq!(LaunchOutcome::InstanceUnresponsive.exit_code(), 2);
    }
}
