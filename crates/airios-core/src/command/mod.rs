// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// coordinator's command processor runs them one at a time against the
// shared connection.

mod route;

pub(crate) use route::route_command;

use airios_api::model::{BusAddress, ResetMode, RfAddress};

use crate::error::CoreError;
use crate::fan::{FanSpeedPreset, PresetMode};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All write operations against nodes behind the bridge.
///
/// Entity commands name their target by node address and entity key
/// (see [`DESCRIPTORS`](crate::entity::DESCRIPTORS)).
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ── Entity controls ──────────────────────────────────────────────
    SetNumber {
        address: BusAddress,
        key: String,
        value: f64,
    },
    SelectOption {
        address: BusAddress,
        key: String,
        option: String,
    },
    SetSwitch {
        address: BusAddress,
        key: String,
        on: bool,
    },
    PressButton {
        address: BusAddress,
        key: String,
    },

    // ── Fan ──────────────────────────────────────────────────────────
    SetFanPreset {
        address: BusAddress,
        preset: PresetMode,
    },
    TurnFanOn {
        address: BusAddress,
        preset: Option<PresetMode>,
    },
    TurnFanOff {
        address: BusAddress,
    },
    SetPresetFanSpeeds {
        address: BusAddress,
        preset: FanSpeedPreset,
        supply_percent: u8,
        exhaust_percent: u8,
    },
    SetPresetModeDuration {
        address: BusAddress,
        preset: PresetMode,
        minutes: u16,
    },
    ResetFilter {
        address: BusAddress,
    },

    // ── Bridge ───────────────────────────────────────────────────────
    /// Reset the bridge. `rf_address` must match the connected bridge.
    ResetBridge {
        rf_address: RfAddress,
        mode: ResetMode,
    },
}

/// Result of a command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    /// The bridge accepted a change; a refresh has been requested.
    Applied,
    /// Nothing to do (already in the requested state, or the bridge
    /// reported no change).
    Unchanged,
}

impl CommandResult {
    pub(crate) fn from_write(accepted: bool) -> Self {
        if accepted { Self::Applied } else { Self::Unchanged }
    }
}
