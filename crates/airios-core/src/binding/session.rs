// ── One binding session ──
//
// Owned by its task for its whole life; nothing else touches it. Each
// transition is published on the progress channel before the next
// bridge request goes out.

use airios_api::Connection;
use airios_api::model::{BindingStatus, BusAddress};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{BindRequest, BindingError, BindingLimits, BindingState, BoundNode};
use crate::allocator::allocate_address;

pub(super) struct BindingSession {
    request: BindRequest,
    limits: BindingLimits,
    last_status: Option<BindingStatus>,
    polls: u32,
    progress: watch::Sender<BindingState>,
}

impl BindingSession {
    pub(super) fn new(
        request: BindRequest,
        limits: BindingLimits,
        progress: watch::Sender<BindingState>,
    ) -> Self {
        Self {
            request,
            limits,
            last_status: None,
            polls: 0,
            progress,
        }
    }

    fn transition(&self, state: BindingState) {
        debug!(kind = self.request.kind(), ?state, "binding state");
        self.progress.send_replace(state);
    }

    fn finish(&self, completed: bool) {
        self.transition(BindingState::Done { completed });
    }

    /// Drive the session to completion.
    pub(super) async fn run(
        mut self,
        connection: &Connection,
        cancel: &CancellationToken,
    ) -> Result<BoundNode, BindingError> {
        info!(
            kind = self.request.kind(),
            product_id = %self.request.product_id(),
            "binding started"
        );

        // ── Allocate ─────────────────────────────────────────────────
        self.transition(BindingState::AllocatingAddress);
        let address = match allocate_address(connection).await {
            Ok(address) => address,
            Err(e) => return Err(self.fail_early(None, e)),
        };

        // ── Initiate ─────────────────────────────────────────────────
        self.transition(BindingState::BindingInitiated { address });
        if cancel.is_cancelled() {
            let err = BindingError::Cancelled {
                address: Some(address),
                last_status: None,
            };
            return Err(self.fail_early(Some(address), err));
        }

        let accepted = match self.send_bind(connection, address).await {
            Ok(accepted) => accepted,
            Err(source) => {
                let err = BindingError::Transport {
                    address: Some(address),
                    last_status: None,
                    source,
                };
                return Err(self.fail_early(Some(address), err));
            }
        };
        if !accepted {
            return Err(self.fail_early(Some(address), BindingError::Rejected { address }));
        }

        // ── Poll ─────────────────────────────────────────────────────
        let outcome = match self.poll_status(connection, cancel, address).await {
            Ok(status) if status == self.request.completed_status() => Ok(status),
            Ok(status) => Err(BindingError::Failed { address, status }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(status) => self.complete(connection, address, status).await,
            Err(err) => {
                if !err.is_timeout() {
                    self.transition(BindingState::Failed {
                        address: Some(address),
                        status: self.last_status,
                    });
                }
                if self.needs_cleanup(&err) {
                    self.cleanup(connection, address).await;
                }
                warn!(%address, error = %err, "binding failed");
                self.finish(false);
                Err(err)
            }
        }
    }

    async fn send_bind(
        &self,
        connection: &Connection,
        address: BusAddress,
    ) -> Result<bool, airios_api::Error> {
        match self.request {
            BindRequest::Controller {
                product_id,
                rf_serial,
            } => {
                connection
                    .bind_controller(address, product_id, rf_serial)
                    .await
            }
            BindRequest::Accessory {
                controller,
                product_id,
            } => {
                connection
                    .bind_accessory(controller, address, product_id)
                    .await
            }
        }
    }

    /// Poll until the status leaves the pending state. Returns the first
    /// non-pending status.
    async fn poll_status(
        &mut self,
        connection: &Connection,
        cancel: &CancellationToken,
        address: BusAddress,
    ) -> Result<BindingStatus, BindingError> {
        let pending = self.request.pending_status();
        let max_polls = self.request.max_polls(&self.limits);

        while self.polls < max_polls {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(self.cancelled(address)),
                () = tokio::time::sleep(self.limits.poll_interval) => {}
            }

            let status = match connection.bind_status().await {
                Ok(Some(status)) => status,
                Ok(None) => {
                    return Err(BindingError::StatusUnavailable {
                        address,
                        last_status: self.last_status,
                    });
                }
                Err(source) => {
                    return Err(BindingError::Transport {
                        address: Some(address),
                        last_status: self.last_status,
                        source,
                    });
                }
            };

            self.polls += 1;
            self.last_status = Some(status);
            self.transition(BindingState::PollingStatus {
                address,
                status,
                polls: self.polls,
            });

            // A settled status wins over a cancel that raced the poll.
            if status != pending {
                return Ok(status);
            }
            if cancel.is_cancelled() {
                return Err(self.cancelled(address));
            }
        }

        self.transition(BindingState::TimedOut {
            address,
            status: self.last_status,
        });
        Err(BindingError::TimedOut {
            address,
            last_status: self.last_status,
            polls: self.polls,
        })
    }

    async fn complete(
        &self,
        connection: &Connection,
        address: BusAddress,
        status: BindingStatus,
    ) -> Result<BoundNode, BindingError> {
        self.transition(BindingState::Completed { address, status });

        // The snapshot has not seen the new node yet; ask the bridge.
        let rf_address = match connection.node(address).rf_address().await {
            Ok(Some(rf)) => rf,
            Ok(None) => {
                return Err(self.fail_late(BindingError::RfAddressUnavailable {
                    address,
                    reason: "no value".into(),
                }));
            }
            Err(e) => {
                return Err(self.fail_late(BindingError::RfAddressUnavailable {
                    address,
                    reason: e.to_string(),
                }));
            }
        };

        info!(%address, rf_address = %rf_address.to_hex(), "binding completed");
        self.finish(true);
        Ok(BoundNode {
            address,
            product_id: self.request.product_id(),
            rf_address,
            status,
        })
    }

    // ── Failure paths ────────────────────────────────────────────────

    fn cancelled(&self, address: BusAddress) -> BindingError {
        BindingError::Cancelled {
            address: Some(address),
            last_status: self.last_status,
        }
    }

    /// Whether the bridge may hold the slot in a binding state.
    fn needs_cleanup(&self, err: &BindingError) -> bool {
        match err {
            BindingError::Failed { .. }
            | BindingError::TimedOut { .. }
            | BindingError::Cancelled { .. } => true,
            BindingError::StatusUnavailable { .. } | BindingError::Transport { .. } => {
                self.limits.unbind_on_poll_error
            }
            _ => false,
        }
    }

    async fn cleanup(&self, connection: &Connection, address: BusAddress) {
        self.transition(BindingState::CleanupUnbind { address });
        match connection.unbind(address).await {
            Ok(true) => debug!(%address, "released bus address"),
            Ok(false) => warn!(%address, "bridge refused unbind"),
            Err(e) => warn!(%address, error = %e, "unbind failed (non-fatal)"),
        }
    }

    /// Failure before the bridge entered a binding state: no cleanup.
    fn fail_early(&self, address: Option<BusAddress>, err: BindingError) -> BindingError {
        warn!(?address, error = %err, "binding failed");
        self.transition(BindingState::Failed {
            address,
            status: self.last_status,
        });
        self.finish(false);
        err
    }

    /// Failure after a completed handshake: the node stays bound.
    fn fail_late(&self, err: BindingError) -> BindingError {
        warn!(error = %err, "binding failed");
        self.transition(BindingState::Failed {
            address: err.address(),
            status: self.last_status,
        });
        self.finish(false);
        err
    }
}
