//! Polling coordinator and binding state machine for Airios RF bridges.
//!
//! This crate sits between `airios-api` (the bridge connection) and a
//! host application:
//!
//! - **[`Coordinator`]**: Owns one bridge. [`start()`](Coordinator::start)
//!   loads the first snapshot and validates the bridge identity, then
//!   spawns the periodic refresh worker and the command processor.
//!   Hosts read the latest [`AiriosData`](airios_api::model::AiriosData)
//!   lock-free and subscribe to refresh outcomes.
//!
//! - **[`SnapshotStore`]** / **[`SnapshotStream`]**: The current snapshot,
//!   swapped wholesale on every successful poll, plus a watch-backed
//!   subscription for reactive consumers.
//!
//! - **[`BindingHandle`]**: A running binding session for a new
//!   controller or accessory, with progress reporting, cancellation and
//!   guaranteed slot cleanup on failure.
//!
//! - **[`Command`]**: Typed write requests routed through an `mpsc`
//!   channel to the coordinator's command processor.
//!
//! - **[`entity`]**: The descriptor table that turns a snapshot into
//!   host-facing sensors, switches, numbers and fans.

pub mod allocator;
pub mod binding;
pub mod command;
pub mod config;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod fan;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use binding::{
    BindRequest, BindingError, BindingHandle, BindingLimits, BindingState, BoundNode,
};
pub use command::{Command, CommandResult};
pub use config::CoordinatorConfig;
pub use coordinator::{BridgeInfo, Coordinator, RefreshEvent, probe_bridge};
pub use entity::{DeviceInfo, Entity, EntityState, Platform, StateValue, materialize};
pub use error::CoreError;
pub use fan::{FanSpeedPreset, PresetMode, available_presets};
pub use store::SnapshotStore;
pub use stream::SnapshotStream;
