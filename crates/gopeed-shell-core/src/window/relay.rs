//! Answers for the primary window before it exists.
//!
//! The primary serves its endpoint as soon as it holds the claim, while the
//! engine is still starting. Until the window is attached, links are queued
//! and show requests succeed without effect: the window comes up shown and
//! in front.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::window::errors::WindowError;
use crate::window::traits::PrimaryWindow;
use crate::window::types::{ShowCommand, ShowState};

struct RelayState<W> {
    window: Option<Arc<W>>,
    queued: Vec<Vec<String>>,
}

pub struct WindowRelay<W> {
    title: String,
    state: Mutex<RelayState<W>>,
}

impl<W: PrimaryWindow> WindowRelay<W> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state: Mutex::new(RelayState {
                window: None,
                queued: Vec::new(),
            }),
        }
    }

    /// Hand over to the created window, replaying queued links in order.
    pub fn attach(&self, window: Arc<W>) {
        let mut state = self.lock();

        let queued = std::mem::take(&mut state.queued);
        if !queued.is_empty() {
            info!(event = "core.window.queued_links_replayed", batches = queued.len());
        }
        for links in queued {
            if let Err(e) = window.open_links(links) {
                warn!(event = "core.window.queued_links_failed", error = %e);
            }
        }

        state.window = Some(window);
    }

    pub fn is_attached(&self) -> bool {
        self.lock().window.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, RelayState<W>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn window(&self) -> Option<Arc<W>> {
        self.lock().window.clone()
    }
}

impl<W: PrimaryWindow> PrimaryWindow for WindowRelay<W> {
    fn title(&self) -> &str {
        &self.title
    }

    fn show_state(&self) -> ShowState {
        self.window()
            .map_or(ShowState::Normal, |window| window.show_state())
    }

    fn is_foreground(&self) -> bool {
        self.window().is_some_and(|window| window.is_foreground())
    }

    fn apply_show_command(&self, command: ShowCommand) -> Result<(), WindowError> {
        match self.window() {
            Some(window) => window.apply_show_command(command),
            None => Ok(()),
        }
    }

    fn bring_to_foreground(&self) -> Result<(), WindowError> {
        match self.window() {
            Some(window) => window.bring_to_foreground(),
            None => Ok(()),
        }
    }

    fn open_links(&self, links: Vec<String>) -> Result<(), WindowError> {
        let mut state = self.lock();
        let window = state.window.clone();
        match window {
            Some(window) => {
                drop(state);
                window.open_links(links)
            }
            None => {
                debug!(event = "core.window.links_queued", count = links.len());
                state.queued.push(links);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::headless::{ActivationKind, HeadlessWindow};
    use crate::window::types::WindowSpec;

    fn window(state: ShowState) -> Arc<HeadlessWindow> {
        Arc::new(HeadlessWindow::with_state(
            WindowSpec::new("gopeed", (10, 10), (1280, 720)),
            state,
            false,
        ))
    }

    #[test]
    fn test_pending_relay_answers_for_the_window() {
        let relay: WindowRelay<HeadlessWindow> = WindowRelay::new("gopeed");

        assert_eq!(relay.title(), "gopeed");
        assert_eq!(relay.show_state(), ShowState::Normal);
        assert!(!relay.is_foreground());
        assert!(relay.apply_show_command(ShowCommand::Restore).is_ok());
        assert!(relay.bring_to_foreground().is_ok());
        assert!(!relay.is_attached());
    }

    #[test]
    fn test_queued_links_replay_in_order_on_attach() {
        let relay = WindowRelay::new("gopeed");
        relay.open_links(vec!["gopeed://1".to_string()]).unwrap();
        relay.open_links(vec!["gopeed://2".to_string()]).unwrap();

        let window = window(ShowState::Normal);
        relay.attach(window.clone());
        relay.open_links(vec!["gopeed://3".to_string()]).unwrap();

        let records = window.records();
        assert!(records.iter().all(|r| r.kind == ActivationKind::Forwarded));
        let links: Vec<_> = records.into_iter().flat_map(|r| r.links).collect();
        assert_eq!(links, vec!["gopeed://1", "gopeed://2", "gopeed://3"]);
    }

    #[test]
    fn test_attached_relay_delegates() {
        let relay = WindowRelay::new("gopeed");
        let window = window(ShowState::Minimized);
        relay.attach(window.clone());

        assert_eq!(relay.show_state(), ShowState::Minimized);
        assert!(relay.bring_to_foreground().is_err());

        relay.apply_show_command(ShowCommand::Restore).unwrap();
        relay.bring_to_foreground().unwrap();
        assert!(window.is_foreground());
        assert!(relay.is_foreground());
    }
}
