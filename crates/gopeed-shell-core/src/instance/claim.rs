//! Exclusive claim on an instance identity.
//!
//! Whoever holds the claim is the primary instance. The operating system
//! releases it when the holder exits, so a crashed primary never leaves the
//! identity claimed.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::instance::errors::ClaimError;
use crate::instance::types::{Endpoint, InstanceIdentity};

/// A held claim. Dropping it releases the identity.
pub trait IdentityClaim {
    fn endpoint(&self) -> &Endpoint;
}

pub trait IdentityClaimer {
    type Claim: IdentityClaim;

    /// Atomically claim `identity`.
    ///
    /// `Ok(None)` means another process holds the claim.
    fn try_claim(&self, identity: &InstanceIdentity) -> Result<Option<Self::Claim>, ClaimError>;
}

/// Claims identities with an OS lock inside the runtime directory.
///
/// Unix takes an exclusive `flock` on `<slug>.lock`; Windows creates the
/// session-local named mutex for the identity.
#[derive(Debug, Clone)]
pub struct LockClaimer {
    runtime_dir: PathBuf,
}

impl LockClaimer {
    pub fn new(runtime_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_dir: runtime_dir.into(),
        }
    }
}

pub struct InstanceLock {
    endpoint: Endpoint,
    #[cfg(unix)]
    _lock: nix::fcntl::Flock<std::fs::File>,
    #[cfg(windows)]
    _mutex: windows_mutex::OwnedMutex,
}

impl std::fmt::Debug for InstanceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceLock")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl IdentityClaim for InstanceLock {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        debug!(event = "core.instance.claim_released", endpoint = %self.endpoint);
    }
}

impl IdentityClaimer for LockClaimer {
    type Claim = InstanceLock;

    #[cfg(unix)]
    fn try_claim(&self, identity: &InstanceIdentity) -> Result<Option<InstanceLock>, ClaimError> {
        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};
        use std::os::unix::fs::DirBuilderExt;

        let endpoint = Endpoint::new(identity, &self.runtime_dir);

        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(&self.runtime_dir)
            .map_err(|source| ClaimError::RuntimeDir {
                path: self.runtime_dir.clone(),
                source,
            })?;

        let path = endpoint.lock_path();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| ClaimError::LockFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => {
                info!(event = "core.instance.claim_acquired", endpoint = %endpoint);
                Ok(Some(InstanceLock {
                    endpoint,
                    _lock: lock,
                }))
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => {
                debug!(event = "core.instance.claim_contended", endpoint = %endpoint);
                Ok(None)
            }
            Err((_, errno)) => Err(ClaimError::LockFailed {
                path: path.display().to_string(),
                message: errno.desc().to_string(),
            }),
        }
    }

    #[cfg(windows)]
    fn try_claim(&self, identity: &InstanceIdentity) -> Result<Option<InstanceLock>, ClaimError> {
        let endpoint = Endpoint::new(identity, &self.runtime_dir);
        let name = endpoint.mutex_name();

        match windows_mutex::OwnedMutex::create(&name)? {
            Some(mutex) => {
                info!(event = "core.instance.claim_acquired", endpoint = %endpoint);
                Ok(Some(InstanceLock {
                    endpoint,
                    _mutex: mutex,
                }))
            }
            None => {
                debug!(event = "core.instance.claim_contended", endpoint = %endpoint);
                Ok(None)
            }
        }
    }
}

#[cfg(windows)]
mod windows_mutex {
    use windows::Win32::Foundation::{CloseHandle, ERROR_ALREADY_EXISTS, GetLastError, HANDLE};
    use windows::Win32::System::Threading::CreateMutexW;
    use windows::core::HSTRING;

    use crate::instance::errors::ClaimError;

    /// Handle to a named mutex this process created.
    #[derive(Debug)]
    pub struct OwnedMutex(HANDLE);

    // The handle is only closed on drop.
    unsafe impl Send for OwnedMutex {}
    unsafe impl Sync for OwnedMutex {}

    impl OwnedMutex {
        /// Create the named mutex. `Ok(None)` if it already existed.
        pub fn create(name: &str) -> Result<Option<Self>, ClaimError> {
            // SAFETY: the name outlives the call and no security attributes are passed.
            let handle = unsafe { CreateMutexW(None, false, &HSTRING::from(name)) }.map_err(
                |e| ClaimError::LockFailed {
                    path: name.to_string(),
                    message: e.to_string(),
                },
            )?;

            // A handle is returned either way; the last error tells whether it was new.
            // SAFETY: reads the calling thread's last-error value.
            let existed = matches!(
                unsafe { GetLastError() },
                Err(e) if e.code() == ERROR_ALREADY_EXISTS.to_hresult()
            );
            let mutex = Self(handle);

            if existed {
                return Ok(None);
            }
            Ok(Some(mutex))
        }
    }

    impl Drop for OwnedMutex {
        fn drop(&mut self) {
            // SAFETY: the handle came from CreateMutexW and is closed once.
            let _ = unsafe { CloseHandle(self.0) };
        }
    }
}
