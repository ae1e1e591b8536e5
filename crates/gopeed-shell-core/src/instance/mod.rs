pub mod claim;
pub mod errors;
pub mod locator;
pub mod types;

pub use claim::{IdentityClaim, IdentityClaimer, InstanceLock, LockClaimer};
pub use errors::{ClaimError, LocatorError};
pub use locator::{InstanceLocator, IpcLocator};
pub use types::{Endpoint, InstanceIdentity, InstanceRef};
