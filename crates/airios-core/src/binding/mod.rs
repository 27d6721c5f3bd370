// ── Binding state machine ──
//
// Binds a new controller or accessory to the bridge:
//
//   Idle → AllocatingAddress → BindingInitiated → PollingStatus
//        → {Completed | Failed | TimedOut} → CleanupUnbind → Done
//
// A session runs as one background task (`BindingHandle`). Once the
// bridge has accepted a bind command, every failure path releases the
// allocated slot with a single best-effort `unbind`.

mod error;
mod handle;
mod session;

use std::time::Duration;

use airios_api::model::{BindingStatus, BusAddress, ProductId, RfAddress};
use serde::Serialize;

pub use error::BindingError;
pub use handle::BindingHandle;

// ── BindingLimits ────────────────────────────────────────────────────

/// Timing of the status poll loop.
///
/// The poll budgets slightly exceed the bridge's own handshake timeouts
/// (20 s outgoing, 120 s incoming) so the bridge reports the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingLimits {
    pub poll_interval: Duration,
    pub controller_max_polls: u32,
    pub accessory_max_polls: u32,
    /// Release the allocated slot when a status poll fails at the
    /// transport level (the bridge may already be mid-handshake).
    pub unbind_on_poll_error: bool,
}

impl Default for BindingLimits {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            controller_max_polls: 100,
            accessory_max_polls: 500,
            unbind_on_poll_error: true,
        }
    }
}

// ── BindRequest ──────────────────────────────────────────────────────

/// What to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindRequest {
    /// Outgoing bind of a ventilation unit controller.
    Controller {
        product_id: ProductId,
        /// Only bind the unit with this RF address, if given.
        rf_serial: Option<RfAddress>,
    },
    /// Incoming bind of a remote or sensor to an already bound
    /// controller.
    Accessory {
        controller: BusAddress,
        product_id: ProductId,
    },
}

impl BindRequest {
    pub fn product_id(&self) -> ProductId {
        match self {
            Self::Controller { product_id, .. } | Self::Accessory { product_id, .. } => {
                *product_id
            }
        }
    }

    /// Status the bridge reports while the handshake is in progress.
    pub fn pending_status(&self) -> BindingStatus {
        match self {
            Self::Controller { .. } => BindingStatus::OutgoingBindingInitialized,
            Self::Accessory { .. } => BindingStatus::IncomingBindingActive,
        }
    }

    /// Status that marks a successful handshake.
    pub fn completed_status(&self) -> BindingStatus {
        match self {
            Self::Controller { .. } => BindingStatus::OutgoingBindingCompleted,
            Self::Accessory { .. } => BindingStatus::IncomingBindingCompleted,
        }
    }

    pub fn max_polls(&self, limits: &BindingLimits) -> u32 {
        match self {
            Self::Controller { .. } => limits.controller_max_polls,
            Self::Accessory { .. } => limits.accessory_max_polls,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Controller { .. } => "controller",
            Self::Accessory { .. } => "accessory",
        }
    }
}

// ── BindingState ─────────────────────────────────────────────────────

/// Progress of one session, published for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BindingState {
    Idle,
    AllocatingAddress,
    BindingInitiated {
        address: BusAddress,
    },
    PollingStatus {
        address: BusAddress,
        status: BindingStatus,
        polls: u32,
    },
    Completed {
        address: BusAddress,
        status: BindingStatus,
    },
    Failed {
        address: Option<BusAddress>,
        status: Option<BindingStatus>,
    },
    TimedOut {
        address: BusAddress,
        status: Option<BindingStatus>,
    },
    CleanupUnbind {
        address: BusAddress,
    },
    Done {
        completed: bool,
    },
}

impl BindingState {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    /// Address allocated so far, if any.
    pub fn address(&self) -> Option<BusAddress> {
        match self {
            Self::Idle | Self::AllocatingAddress | Self::Done { .. } => None,
            Self::Failed { address, .. } => *address,
            Self::BindingInitiated { address }
            | Self::PollingStatus { address, .. }
            | Self::Completed { address, .. }
            | Self::TimedOut { address, .. }
            | Self::CleanupUnbind { address } => Some(*address),
        }
    }
}

// ── BoundNode ────────────────────────────────────────────────────────

/// A successfully bound node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundNode {
    pub address: BusAddress,
    pub product_id: ProductId,
    pub rf_address: RfAddress,
    pub status: BindingStatus,
}
