// ── Decoded property values ──
//
// Values arrive already decoded by the client. The core only inspects
// them (availability, presets, capability checks) and writes a handful
// back; it never deals with register encodings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A decoded property value, tagged by shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Duration(Duration),
    Temperature(Temperature),
    Co2(Co2Level),
    BypassPosition(BypassPosition),
    Heater(Heater),
    Battery(BatteryStatus),
    Fault(FaultStatus),
    VentilationSpeed(VentilationSpeed),
    RequestedVentilationSpeed(RequestedVentilationSpeed),
    BypassMode(BypassMode),
    ErrorCode(ErrorCode),
    Capabilities(Capabilities),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_ventilation_speed(&self) -> Option<VentilationSpeed> {
        match self {
            Self::VentilationSpeed(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bypass_mode(&self) -> Option<BypassMode> {
        match self {
            Self::BypassMode(m) => Some(*m),
            _ => None,
        }
    }

    pub fn as_capabilities(&self) -> Option<Capabilities> {
        match self {
            Self::Capabilities(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

// ── Sensor readings ─────────────────────────────────────────────────

/// Health of an analog sensor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorStatus {
    Ok,
    ShortCircuit,
    OpenCircuit,
    NotAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub celsius: f64,
    pub status: SensorStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Co2Level {
    pub ppm: u16,
    pub status: SensorStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BypassPosition {
    /// Percent open.
    pub position: u8,
    pub error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaterStatus {
    Ok,
    Error,
    NotAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heater {
    /// Percent of full power.
    pub level: u8,
    pub status: HeaterStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    pub available: bool,
    /// Non-zero when the battery is low.
    pub low: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultStatus {
    pub available: bool,
    pub fault: bool,
}

// ── Ventilation control ─────────────────────────────────────────────

/// Speed the ventilation unit currently runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VentilationSpeed {
    Off,
    Low,
    Mid,
    High,
    OverrideLow,
    OverrideMid,
    OverrideHigh,
    Away,
    Boost,
    Auto,
}

/// Speed that can be requested from the ventilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedVentilationSpeed {
    Off,
    Low,
    Mid,
    High,
    Away,
    Boost,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassMode {
    Close,
    Open,
    Auto,
    Unknown,
}

/// Ventilation unit error register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NoError,
    NonSpecificFault,
    EmergencyStop,
    Fan1Error,
    Fan2Error,
    X20SensorError,
    X21SensorError,
    X22SensorError,
    X23SensorError,
    BindingModeActive,
    IdentificationActive,
    Other(u16),
}

impl ErrorCode {
    /// Stable name, `None` for codes the core has no name for.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::NoError => Some("no_error"),
            Self::NonSpecificFault => Some("non_specific_fault"),
            Self::EmergencyStop => Some("emergency_stop"),
            Self::Fan1Error => Some("fan_1_error"),
            Self::Fan2Error => Some("fan_2_error"),
            Self::X20SensorError => Some("x20_sensor_error"),
            Self::X21SensorError => Some("x21_sensor_error"),
            Self::X22SensorError => Some("x22_sensor_error"),
            Self::X23SensorError => Some("x23_sensor_error"),
            Self::BindingModeActive => Some("binding_mode_active"),
            Self::IdentificationActive => Some("identification_active"),
            Self::Other(_) => None,
        }
    }
}

/// Feature set advertised by a ventilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(u16);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const OFF_CAPABLE: Self = Self(1 << 0);
    pub const BOOST_MODE_CAPABLE: Self = Self(1 << 1);
    pub const AWAY_MODE_CAPABLE: Self = Self(1 << 2);
    pub const TIMER_CAPABLE: Self = Self(1 << 3);
    pub const AUTO_MODE_CAPABLE: Self = Self(1 << 4);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_combine() {
        let caps = Capabilities::OFF_CAPABLE | Capabilities::TIMER_CAPABLE;
        assert!(caps.contains(Capabilities::OFF_CAPABLE));
        assert!(caps.contains(Capabilities::TIMER_CAPABLE));
        assert!(!caps.contains(Capabilities::BOOST_MODE_CAPABLE));
    }

    #[test]
    fn accessors_reject_other_shapes() {
        assert_eq!(Value::Integer(1).as_bool(), Some(true));
        assert_eq!(Value::Integer(3).as_f64(), Some(3.0));
        assert_eq!(Value::Text("x".into()).as_i64(), None);
        assert_eq!(Value::Bool(true).as_ventilation_speed(), None);
    }
}
