use tracing::info;

use crate::engine::errors::EngineError;
use crate::engine::types::{Engine, EngineHandle};

/// A started engine, stopped exactly once when closed or dropped.
pub struct EngineSession<'a, E: Engine + ?Sized> {
    engine: &'a E,
    handle: EngineHandle,
    open: bool,
}

impl<'a, E: Engine + ?Sized> EngineSession<'a, E> {
    pub fn open(engine: &'a E, config: &str) -> Result<Self, EngineError> {
        let handle = engine.start(config)?;
        info!(event = "core.engine.session_opened", handle = handle.get());

        Ok(Self {
            engine,
            handle,
            open: true,
        })
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle
    }

    pub fn close(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.open {
            self.open = false;
            self.engine.stop();
            info!(event = "core.engine.session_closed", handle = self.handle.get());
        }
    }
}

impl<E: Engine + ?Sized> Drop for EngineSession<'_, E> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingEngine {
        starts: AtomicUsize,
        stops: AtomicUsize,
        fail: bool,
    }

    impl Engine for CountingEngine {
        fn start(&self, _config: &str) -> Result<EngineHandle, EngineError> {
            if self.fail {
                return Err(EngineError::StartFailed {
                    message: "boom".to_string(),
                });
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            EngineHandle::new(9000)
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_close_stops_once() {
        let engine = CountingEngine::default();
        let session = EngineSession::open(&engine, "{}").unwrap();
        assert_eq!(session.handle().get(), 9000);

        session.close();
        assert_eq!(engine.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_stops() {
        let engine = CountingEngine::default();
        {
            let _session = EngineSession::open(&engine, "{}").unwrap();
        }
        assert_eq!(engine.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_start_does_not_stop() {
        let engine = CountingEngine {
            fail: true,
            ..Default::default()
        };
        assert!(EngineSession::open(&engine, "{}").is_err());
        assert_eq!(engine.starts.load(Ordering::SeqCst), 0);
        assert_eq!(engine.stops.load(Ordering::SeqCst), 0);
    }
}
