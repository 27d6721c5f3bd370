// ── Core error types ──
//
// User-facing errors from airios-core. Consumers never see raw transport
// errors: the `From<airios_api::Error>` impl translates them into
// domain-appropriate variants. Binding failures keep their own typed
// error so callers can inspect the last bridge status.

use airios_api::model::{BusAddress, ProductId, Property};
use thiserror::Error;

use crate::binding::BindingError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot communicate with bridge: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Bridge request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Bridge connection closed")]
    Disconnected,

    // ── Setup errors ─────────────────────────────────────────────────
    /// The bridge is not usable yet; the host should retry setup later.
    #[error("Bridge not ready: {reason}")]
    NotReady { reason: String },

    #[error("Unexpected device: expected {expected}, found {found}")]
    UnexpectedDevice { expected: ProductId, found: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("No node at bus address {address}")]
    NodeNotFound { address: BusAddress },

    #[error("Property {property} not supported by node {address}")]
    PropertyUnsupported {
        address: BusAddress,
        property: Property,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected by bridge: {message}")]
    Rejected { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("A binding session is already in progress")]
    BindingInProgress,

    /// A poll failed; the previous snapshot remains current.
    #[error("Update failed: {message}")]
    UpdateFailed { message: String },

    // ── Binding errors ───────────────────────────────────────────────
    #[error(transparent)]
    Binding(#[from] BindingError),

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. }
                | Self::Timeout { .. }
                | Self::NotReady { .. }
                | Self::UpdateFailed { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<airios_api::Error> for CoreError {
    fn from(err: airios_api::Error) -> Self {
        match err {
            airios_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            airios_api::Error::Closed => CoreError::Disconnected,
            airios_api::Error::Io(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            airios_api::Error::Transport { message } => CoreError::ConnectionFailed {
                reason: message,
            },
            airios_api::Error::Protocol { message } => CoreError::ConnectionFailed {
                reason: format!("malformed response: {message}"),
            },
            airios_api::Error::Unsupported(operation) => CoreError::Rejected {
                message: format!("{operation} not supported by bridge"),
            },
        }
    }
}
