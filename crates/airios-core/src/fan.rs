// ── Fan presets ──
//
// Maps between what the unit reports (`VentilationSpeed`), what the
// host picks (`PresetMode`), and what gets written back
// (`RequestedVentilationSpeed` or an override timer).

use airios_api::model::{Capabilities, Property, RequestedVentilationSpeed, VentilationSpeed};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Minutes a temporary override preset runs for.
pub const OVERRIDE_MINUTES: i64 = 60;

/// A fan preset as offered to the host.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
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
pub enum PresetMode {
    Off,
    Low,
    Medium,
    High,
    LowOverride,
    MediumOverride,
    HighOverride,
    Away,
    Boost,
    Auto,
}

impl From<VentilationSpeed> for PresetMode {
    fn from(speed: VentilationSpeed) -> Self {
        match speed {
            VentilationSpeed::Off => Self::Off,
            VentilationSpeed::Low => Self::Low,
            VentilationSpeed::Mid => Self::Medium,
            VentilationSpeed::High => Self::High,
            VentilationSpeed::OverrideLow => Self::LowOverride,
            VentilationSpeed::OverrideMid => Self::MediumOverride,
            VentilationSpeed::OverrideHigh => Self::HighOverride,
            VentilationSpeed::Away => Self::Away,
            VentilationSpeed::Boost => Self::Boost,
            VentilationSpeed::Auto => Self::Auto,
        }
    }
}

impl PresetMode {
    /// The speed to request for this preset. Overrides request their
    /// base speed.
    pub fn requested_speed(self) -> RequestedVentilationSpeed {
        match self {
            Self::Off => RequestedVentilationSpeed::Off,
            Self::Low | Self::LowOverride => RequestedVentilationSpeed::Low,
            Self::Medium | Self::MediumOverride => RequestedVentilationSpeed::Mid,
            Self::High | Self::HighOverride => RequestedVentilationSpeed::High,
            Self::Away => RequestedVentilationSpeed::Away,
            Self::Boost => RequestedVentilationSpeed::Boost,
            Self::Auto => RequestedVentilationSpeed::Auto,
        }
    }

    /// Override timer property for the `*_override` presets.
    pub fn override_timer(self) -> Option<Property> {
        match self {
            Self::LowOverride => Some(Property::OverrideTimeSpeedLow),
            Self::MediumOverride => Some(Property::OverrideTimeSpeedMid),
            Self::HighOverride => Some(Property::OverrideTimeSpeedHigh),
            _ => None,
        }
    }

    /// Override timer property for a timed run of a base preset. Only
    /// low, medium and high can be timed.
    pub fn duration_timer(self) -> Option<Property> {
        match self {
            Self::Low => Some(Property::OverrideTimeSpeedLow),
            Self::Medium => Some(Property::OverrideTimeSpeedMid),
            Self::High => Some(Property::OverrideTimeSpeedHigh),
            _ => None,
        }
    }

    pub fn is_on(self) -> bool {
        self != Self::Off
    }
}

/// Presets the unit supports, in display order.
pub fn available_presets(capabilities: Option<Capabilities>) -> Vec<PresetMode> {
    let mut presets = vec![PresetMode::Low, PresetMode::Medium, PresetMode::High];
    let Some(caps) = capabilities else {
        return presets;
    };

    if caps.contains(Capabilities::OFF_CAPABLE) {
        presets.push(PresetMode::Off);
    }
    if caps.contains(Capabilities::AUTO_MODE_CAPABLE) {
        presets.push(PresetMode::Auto);
    }
    if caps.contains(Capabilities::AWAY_MODE_CAPABLE) {
        presets.push(PresetMode::Away);
    }
    if caps.contains(Capabilities::BOOST_MODE_CAPABLE) {
        presets.push(PresetMode::Boost);
    }
    if caps.contains(Capabilities::TIMER_CAPABLE) {
        presets.extend([
            PresetMode::LowOverride,
            PresetMode::MediumOverride,
            PresetMode::HighOverride,
        ]);
    }
    presets
}

/// Preset whose supply and exhaust fan speeds can be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FanSpeedPreset {
    Away,
    Low,
    Medium,
    High,
}

impl FanSpeedPreset {
    /// `(supply, exhaust)` properties for this preset.
    pub fn properties(self) -> (Property, Property) {
        match self {
            Self::Away => (Property::FanSpeedAwaySupply, Property::FanSpeedAwayExhaust),
            Self::Low => (Property::FanSpeedLowSupply, Property::FanSpeedLowExhaust),
            Self::Medium => (Property::FanSpeedMidSupply, Property::FanSpeedMidExhaust),
            Self::High => (Property::FanSpeedHighSupply, Property::FanSpeedHighExhaust),
        }
    }
}
