use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, warn};

use crate::instance::errors::LocatorError;
use crate::instance::types::{Endpoint, InstanceIdentity, InstanceRef};
use crate::ipc::{InstanceClient, IpcError};

/// Finds the running instance for an identity, if there is one.
///
/// "Not found" is `Ok(None)`, never an error. An error means the lookup
/// itself could not be performed.
pub trait InstanceLocator {
    fn find_instance(&self, identity: &InstanceIdentity) -> Result<Option<InstanceRef>, LocatorError>;
}

/// Locates the running instance by probing its channel endpoint.
///
/// Only an instance that answers `ping` with the expected title counts as
/// found. A socket left behind by a crashed instance is not.
#[derive(Debug, Clone)]
pub struct IpcLocator {
    runtime_dir: PathBuf,
    timeout: Duration,
}

impl IpcLocator {
    pub fn new(runtime_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
            timeout,
        }
    }
}

impl InstanceLocator for IpcLocator {
    fn find_instance(&self, identity: &InstanceIdentity) -> Result<Option<InstanceRef>, LocatorError> {
        let endpoint = Endpoint::new(identity, &self.runtime_dir);

        let status = match InstanceClient::connect(&endpoint, self.timeout)
            .and_then(|mut client| client.ping())
        {
            Ok(status) => status,
            Err(IpcError::NotRunning) => {
                debug!(event = "core.instance.locate_not_found", endpoint = %endpoint);
                return Ok(None);
            }
            Err(e) => {
                return Err(LocatorError::QueryFailed {
                    endpoint: endpoint.to_string(),
                    message: e.to_string(),
                });
            }
        };

        if status.title != identity.title() {
            warn!(
                event = "core.instance.locate_title_mismatch",
                endpoint = %endpoint,
                expected = identity.title(),
                actual = status.title,
            );
            return Ok(None);
        }

        debug!(
            event = "core.instance.locate_found",
            endpoint = %endpoint,
            pid = status.pid,
        );

        Ok(Some(InstanceRef {
            identity: identity.clone(),
            endpoint,
            pid: Some(status.pid),
        }))
    }
}
