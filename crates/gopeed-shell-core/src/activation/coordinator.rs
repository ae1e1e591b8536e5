use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::activation::channel::InstanceChannel;
use crate::activation::errors::ActivationError;
use crate::activation::types::{ActivationPayload, ForwardReport, LaunchState, Resolution};
use crate::instance::{IdentityClaimer, InstanceIdentity, InstanceLocator, InstanceRef};
use crate::window::ShowCommand;

const CLAIM_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Decides whether this launch forwards to the running instance or becomes it.
///
/// Never lets a second instance come up once one has been observed: the
/// identity claim is only taken when no instance is found, and the claim is
/// exclusive.
pub struct ActivationCoordinator<L, C, R> {
    identity: InstanceIdentity,
    locator: L,
    channel: C,
    claimer: R,
    delivery_retries: u32,
    claim_wait: Duration,
}

impl<L, C, R> ActivationCoordinator<L, C, R>
where
    L: InstanceLocator,
    C: InstanceChannel,
    R: IdentityClaimer,
{
    pub fn new(identity: InstanceIdentity, locator: L, channel: C, claimer: R) -> Self {
        Self {
            identity,
            locator,
            channel,
            claimer,
            delivery_retries: 1,
            claim_wait: Duration::from_millis(crate::config::defaults::default_claim_wait_ms()),
        }
    }

    pub fn with_delivery_retries(mut self, retries: u32) -> Self {
        self.delivery_retries = retries;
        self
    }

    pub fn with_claim_wait(mut self, wait: Duration) -> Self {
        self.claim_wait = wait;
        self
    }

    pub fn identity(&self) -> &InstanceIdentity {
        &self.identity
    }

    /// Resolve this launch: forward `payload`, or claim the identity.
    ///
    /// Only a failure to claim is an error. An instance that cannot be
    /// activated resolves to [`Resolution::Unresponsive`].
    pub fn resolve(
        &self,
        payload: ActivationPayload,
    ) -> Result<Resolution<R::Claim>, ActivationError> {
        info!(
            event = "core.activation.resolve_started",
            state = LaunchState::Start.as_str(),
            identity = %self.identity,
            args = payload.len(),
        );

        // One id for every delivery attempt of this launch.
        let activation = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let mut failures = 0u32;
        let mut located = self.locate();

        loop {
            let Some(target) = located else {
                if let Some(claim) = self.claimer.try_claim(&self.identity)? {
                    info!(
                        event = "core.activation.resolve_completed",
                        state = LaunchState::Primary.as_str(),
                    );
                    return Ok(Resolution::Primary { claim, payload });
                }

                // Another launch won the claim and is still coming up.
                if started.elapsed() >= self.claim_wait {
                    let error = ActivationError::ClaimWaitElapsed {
                        waited_ms: self.claim_wait.as_millis() as u64,
                    };
                    warn!(event = "core.activation.claim_wait_elapsed", error = %error);
                    return Ok(Resolution::Unresponsive {
                        target: None,
                        error,
                    });
                }

                std::thread::sleep(CLAIM_POLL_INTERVAL);
                located = self.locate();
                continue;
            };

            match self.forward(&target, &activation, &payload) {
                Ok(report) => {
                    info!(
                        event = "core.activation.resolve_completed",
                        state = LaunchState::Forwarding.as_str(),
                        pid = ?report.pid,
                        links = report.links_delivered,
                        foreground = report.foreground,
                    );
                    return Ok(Resolution::Forwarded(report));
                }
                Err(error) => {
                    failures += 1;
                    warn!(
                        event = "core.activation.delivery_failed",
                        attempt = failures,
                        error = %error,
                    );

                    located = self.locate();
                    if let Some(current) = &located
                        && failures > self.delivery_retries
                    {
                        self.best_effort_restore(current);
                        return Ok(Resolution::Unresponsive {
                            target: located,
                            error,
                        });
                    }

                    if located.is_none() {
                        info!(event = "core.activation.target_vanished");
                    }
                }
            }
        }
    }

    /// Look the instance up. A failed lookup counts as "none found".
    fn locate(&self) -> Option<InstanceRef> {
        match self.locator.find_instance(&self.identity) {
            Ok(found) => found,
            Err(e) => {
                warn!(event = "core.activation.locate_failed", error = %e);
                None
            }
        }
    }

    /// Hand the payload over, then restore and foreground the target.
    ///
    /// Fails only when nothing reached the target. Once the payload is
    /// delivered, later steps are best effort and recorded in the report.
    fn forward(
        &self,
        target: &InstanceRef,
        activation: &str,
        payload: &ActivationPayload,
    ) -> Result<ForwardReport, ActivationError> {
        let undelivered = |source| ActivationError::SignalDeliveryFailed {
            endpoint: target.endpoint.to_string(),
            source,
        };

        let mut report = ForwardReport {
            target: target.clone(),
            pid: target.pid,
            links_delivered: 0,
            previous_state: None,
            applied: None,
            foreground: false,
        };

        if !payload.is_empty() {
            self.channel
                .deliver(target, activation, payload.as_slice())
                .map_err(undelivered)?;
            report.links_delivered = payload.len();
            debug!(event = "core.activation.payload_delivered", count = payload.len());
        }

        match self.channel.show_state(target) {
            Ok(state) => {
                report.previous_state = Some(state);
                let command = ShowCommand::reassert(state);
                match self.channel.show(target, command) {
                    Ok(()) => report.applied = Some(command),
                    Err(e) => warn!(event = "core.activation.show_failed", error = %e),
                }
            }
            // With nothing delivered, the state query is the liveness check.
            Err(e) if payload.is_empty() => return Err(undelivered(e)),
            Err(e) => warn!(event = "core.activation.state_query_failed", error = %e),
        }

        match self.channel.bring_to_foreground(target) {
            Ok(()) => report.foreground = true,
            Err(e) => warn!(event = "core.activation.foreground_failed", error = %e),
        }

        Ok(report)
    }

    fn best_effort_restore(&self, target: &InstanceRef) {
        let command = self
            .channel
            .show_state(target)
            .map(ShowCommand::reassert)
            .unwrap_or(ShowCommand::Restore);

        if let Err(e) = self.channel.show(target, command) {
            debug!(event = "core.activation.restore_failed", error = %e);
        }
        if let Err(e) = self.channel.bring_to_foreground(target) {
            debug!(event = "core.activation.foreground_failed", error = %e);
        }
    }
}
