// ── Binding protocol values ──

use serde::{Deserialize, Serialize};

/// Bridge-side status of the current (or last) binding handshake.
///
/// Outgoing statuses belong to controller binds (the bridge binds to a
/// ventilation unit); incoming statuses to accessory binds (a remote
/// binds to a controller through the bridge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingStatus {
    NotAvailable,
    OutgoingBindingInitialized,
    OutgoingBindingCompleted,
    OutgoingBindingFailedNoAnswer,
    OutgoingBindingFailedIncompatibleDevice,
    OutgoingBindingFailedNodeListFull,
    OutgoingBindingFailedModbusAddressInvalid,
    OutgoingBindingFailedInvalidSerialNumber,
    IncomingBindingActive,
    IncomingBindingCompleted,
    IncomingBindingFailedTimeout,
    IncomingBindingFailedIncompatibleDevice,
    IncomingBindingFailedNodeListFull,
    /// A status code the client could not name.
    Other(u16),
}

impl BindingStatus {
    /// Whether the bridge still considers the handshake in progress.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            Self::OutgoingBindingInitialized | Self::IncomingBindingActive
        )
    }

    pub fn is_completed(self) -> bool {
        matches!(
            self,
            Self::OutgoingBindingCompleted | Self::IncomingBindingCompleted
        )
    }
}

/// Reset applied to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Restart, keeping bound nodes and settings.
    Soft,
    /// Restore factory settings, dropping every binding.
    Factory,
}
