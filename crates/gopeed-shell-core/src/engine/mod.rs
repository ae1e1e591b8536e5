//! Boundary to the download engine.
//!
//! The shell only ever starts and stops the engine. An [`EngineSession`]
//! owns the started engine and guarantees it is stopped on every exit path.

pub mod errors;
pub mod process;
pub mod session;
pub mod types;

pub use errors::EngineError;
pub use process::ProcessEngine;
pub use session::EngineSession;
pub use types::{Engine, EngineHandle};
