use std::fmt;

use crate::engine::errors::EngineError;

/// Handle returned by a started engine. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(i64);

impl EngineHandle {
    pub fn new(raw: i64) -> Result<Self, EngineError> {
        if raw == 0 {
            return Err(EngineError::InvalidHandle { handle: raw });
        }
        Ok(Self(raw))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The download engine boundary.
///
/// `stop` must be safe to call when the engine never started or has
/// already stopped.
pub trait Engine {
    fn start(&self, config: &str) -> Result<EngineHandle, EngineError>;

    fn stop(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_handle_is_rejected() {
        assert!(matches!(
            EngineHandle::new(0),
            Err(EngineError::InvalidHandle { handle: 0 })
        ));
    }

    #[test]
    fn test_nonzero_handle() {
        let handle = EngineHandle::new(17842).unwrap();
        assert_eq!(handle.get(), 17842);
        assert_eq!(handle.to_string(), "17842");
        assert!(EngineHandle::new(-1).is_ok());
    }
}
