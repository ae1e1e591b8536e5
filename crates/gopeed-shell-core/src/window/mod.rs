pub mod errors;
pub mod headless;
pub mod relay;
pub mod traits;
pub mod types;

pub use errors::WindowError;
pub use headless::{ActivationKind, ActivationRecord, HeadlessHost, HeadlessWindow};
pub use relay::WindowRelay;
pub use traits::{PrimaryWindow, WindowHost};
pub use types::{ShowCommand, ShowState, WindowSpec};
