use airios_api::model::{BindingStatus, BusAddress};
use thiserror::Error;

/// Terminal failure of a binding session.
///
/// Every variant reached after the bind command was sent carries the
/// allocated address and the last status the bridge reported.
#[derive(Debug, Error)]
pub enum BindingError {
    // ── Before the bridge is involved ────────────────────────────────
    #[error("No bus addresses available")]
    NoAddressAvailable,

    // ── Bridge outcomes ──────────────────────────────────────────────
    #[error("Bridge rejected the bind command for address {address}")]
    Rejected { address: BusAddress },

    #[error("Binding at address {address} failed with status {status:?}")]
    Failed {
        address: BusAddress,
        status: BindingStatus,
    },

    #[error("Binding at address {address} timed out after {polls} polls (last status {last_status:?})")]
    TimedOut {
        address: BusAddress,
        last_status: Option<BindingStatus>,
        polls: u32,
    },

    // ── Protocol failures ────────────────────────────────────────────
    #[error("Bridge returned no binding status for address {address}")]
    StatusUnavailable {
        address: BusAddress,
        last_status: Option<BindingStatus>,
    },

    #[error("Bridge communication failed during binding: {source}")]
    Transport {
        address: Option<BusAddress>,
        last_status: Option<BindingStatus>,
        #[source]
        source: airios_api::Error,
    },

    #[error("Bound node at address {address} did not report its RF address: {reason}")]
    RfAddressUnavailable { address: BusAddress, reason: String },

    // ── Session lifecycle ────────────────────────────────────────────
    #[error("Binding cancelled")]
    Cancelled {
        address: Option<BusAddress>,
        last_status: Option<BindingStatus>,
    },

    #[error("Binding task aborted: {reason}")]
    Aborted { reason: String },
}

impl BindingError {
    /// Last binding status observed before the failure.
    pub fn last_status(&self) -> Option<BindingStatus> {
        match self {
            Self::Failed { status, .. } => Some(*status),
            Self::TimedOut { last_status, .. }
            | Self::StatusUnavailable { last_status, .. }
            | Self::Transport { last_status, .. }
            | Self::Cancelled { last_status, .. } => *last_status,
            Self::NoAddressAvailable
            | Self::Rejected { .. }
            | Self::RfAddressUnavailable { .. }
            | Self::Aborted { .. } => None,
        }
    }

    /// Bus address the session had allocated, if it got that far.
    pub fn address(&self) -> Option<BusAddress> {
        match self {
            Self::Rejected { address }
            | Self::Failed { address, .. }
            | Self::TimedOut { address, .. }
            | Self::StatusUnavailable { address, .. }
            | Self::RfAddressUnavailable { address, .. } => Some(*address),
            Self::Transport { address, .. } | Self::Cancelled { address, .. } => *address,
            Self::NoAddressAvailable | Self::Aborted { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
