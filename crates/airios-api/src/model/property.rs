// ── Property identifiers ──
//
// One flat identifier space across device, bridge and ventilation unit
// properties. The snake_case key is stable and used in entity ids.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// A named, typed attribute of a node.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum Property {
    // ── Every node ───────────────────────────────────────────────────
    RfAddress,
    ProductId,
    ProductName,
    SoftwareVersion,
    RfCommStatus,
    BatteryStatus,
    FaultStatus,

    // ── Bridge ───────────────────────────────────────────────────────
    RfLoadLastHour,
    RfLoadCurrentHour,
    MessagesSendLastHour,
    MessagesSendCurrentHour,
    Uptime,

    // ── Ventilation unit: speed control ──────────────────────────────
    CurrentVentilationSpeed,
    RequestedVentilationSpeed,
    Capabilities,
    OverrideTimeSpeedLow,
    OverrideTimeSpeedMid,
    OverrideTimeSpeedHigh,
    VentilationSpeedOverrideRemainingTime,
    FanSpeedAwaySupply,
    FanSpeedAwayExhaust,
    FanSpeedLowSupply,
    FanSpeedLowExhaust,
    FanSpeedMidSupply,
    FanSpeedMidExhaust,
    FanSpeedHighSupply,
    FanSpeedHighExhaust,

    // ── Ventilation unit: measurements ───────────────────────────────
    TemperatureExhaust,
    TemperatureInlet,
    TemperatureOutlet,
    TemperatureSupply,
    FanRpmExhaust,
    FanRpmSupply,
    FanSpeedExhaust,
    FanSpeedSupply,
    ErrorCode,
    Defrost,
    Postheater,
    Co2Level,

    // ── Ventilation unit: filter ─────────────────────────────────────
    FilterDirty,
    FilterDuration,
    FilterRemainingPercent,
    FilterReset,

    // ── Ventilation unit: bypass ─────────────────────────────────────
    BypassPosition,
    BypassMode,
    RequestedBypassMode,

    // ── Ventilation unit: setpoints ──────────────────────────────────
    PreheaterSetpoint,
    FrostProtectionPreheaterSetpoint,
    FreeVentilationHeatingSetpoint,
    FreeVentilationCoolingOffset,
    Co2ControlSetpoint,
    BasicVentilationEnable,
}

impl Property {
    /// Stable snake_case key, e.g. `temperature_supply`.
    pub fn key(self) -> &'static str {
        self.into()
    }
}
