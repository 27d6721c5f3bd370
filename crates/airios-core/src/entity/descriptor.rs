// ── Entity descriptor table ──
//
// One row per (platform, property) pair a host may expose. Rows are
// selected per node by whether the node reports the property.

use std::borrow::Cow;

use airios_api::model::{
    BypassMode, HeaterStatus, Property, SensorStatus, Value, VentilationSpeed,
};

use super::{Platform, StateValue};
use crate::fan::PresetMode;

/// Turns a raw property value into an entity state. `None` means the
/// entity is unavailable.
pub type Decode = fn(&Value) -> Option<StateValue>;

/// Static description of one entity.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub property: Property,
    /// Stable key used in unique ids and command lookups.
    pub key: &'static str,
    pub platform: PlatformSpec,
}

/// Per-platform parameters.
#[derive(Debug)]
pub enum PlatformSpec {
    Sensor {
        unit: Option<&'static str>,
        diagnostic: bool,
        enabled_by_default: bool,
        decode: Decode,
    },
    BinarySensor {
        decode: Decode,
    },
    Switch {
        write: Property,
    },
    Select {
        options: &'static [&'static str],
        write: Property,
    },
    Number {
        min: f64,
        max: f64,
        step: f64,
        unit: Option<&'static str>,
        write: Property,
    },
    Button {
        write: Property,
        press_value: i64,
    },
    Fan,
}

impl EntityDescriptor {
    pub fn platform(&self) -> Platform {
        match self.platform {
            PlatformSpec::Sensor { .. } => Platform::Sensor,
            PlatformSpec::BinarySensor { .. } => Platform::BinarySensor,
            PlatformSpec::Switch { .. } => Platform::Switch,
            PlatformSpec::Select { .. } => Platform::Select,
            PlatformSpec::Number { .. } => Platform::Number,
            PlatformSpec::Button { .. } => Platform::Button,
            PlatformSpec::Fan => Platform::Fan,
        }
    }

    /// Decode the raw value for display.
    pub fn decode(&self, value: &Value) -> Option<StateValue> {
        match &self.platform {
            PlatformSpec::Sensor { decode, .. } | PlatformSpec::BinarySensor { decode } => {
                decode(value)
            }
            PlatformSpec::Switch { .. } => value.as_bool().map(StateValue::Bool),
            PlatformSpec::Select { .. } => bypass_mode(value),
            PlatformSpec::Number { .. } => value.as_f64().map(StateValue::Float),
            PlatformSpec::Button { .. } => plain(value),
            PlatformSpec::Fan => value
                .as_ventilation_speed()
                .map(|speed| StateValue::Text(Cow::Borrowed(preset_name(speed)))),
        }
    }
}

/// Look up a descriptor by platform and key.
pub fn descriptor(platform: Platform, key: &str) -> Option<&'static EntityDescriptor> {
    DESCRIPTORS
        .iter()
        .find(|d| d.platform() == platform && d.key == key)
}

// ── Decoders ────────────────────────────────────────────────────────

fn plain(value: &Value) -> Option<StateValue> {
    match value {
        Value::Bool(b) => Some(StateValue::Bool(*b)),
        Value::Integer(i) => Some(StateValue::Integer(*i)),
        Value::Float(f) => Some(StateValue::Float(*f)),
        Value::Text(s) => Some(StateValue::Text(Cow::Owned(s.clone()))),
        _ => None,
    }
}

fn seconds(value: &Value) -> Option<StateValue> {
    let secs = value.as_duration()?.as_secs();
    i64::try_from(secs).ok().map(StateValue::Integer)
}

fn temperature(value: &Value) -> Option<StateValue> {
    match value {
        Value::Temperature(t) if t.status == SensorStatus::Ok => {
            Some(StateValue::Float(t.celsius))
        }
        _ => None,
    }
}

fn co2(value: &Value) -> Option<StateValue> {
    match value {
        Value::Co2(c) if c.status == SensorStatus::Ok => Some(StateValue::Integer(c.ppm.into())),
        _ => None,
    }
}

fn bypass_position(value: &Value) -> Option<StateValue> {
    match value {
        Value::BypassPosition(p) if !p.error => Some(StateValue::Integer(p.position.into())),
        _ => None,
    }
}

fn postheater(value: &Value) -> Option<StateValue> {
    match value {
        Value::Heater(h) if h.status == HeaterStatus::Ok => {
            Some(StateValue::Integer(h.level.into()))
        }
        _ => None,
    }
}

fn nonzero_minutes(value: &Value) -> Option<StateValue> {
    match value.as_i64()? {
        0 => None,
        minutes => Some(StateValue::Integer(minutes)),
    }
}

fn error_code(value: &Value) -> Option<StateValue> {
    match value {
        Value::ErrorCode(code) => code.name().map(|n| StateValue::Text(Cow::Borrowed(n))),
        _ => None,
    }
}

fn fault(value: &Value) -> Option<StateValue> {
    match value {
        Value::Fault(f) if f.available => Some(StateValue::Bool(f.fault)),
        _ => None,
    }
}

fn battery_low(value: &Value) -> Option<StateValue> {
    match value {
        Value::Battery(b) if b.available => Some(StateValue::Bool(b.low != 0)),
        _ => None,
    }
}

/// 0 means connected, 1 means lost.
fn rf_comm(value: &Value) -> Option<StateValue> {
    match value.as_i64()? {
        0 => Some(StateValue::Bool(true)),
        1 => Some(StateValue::Bool(false)),
        _ => None,
    }
}

fn flag(value: &Value) -> Option<StateValue> {
    value.as_bool().map(StateValue::Bool)
}

fn bypass_mode(value: &Value) -> Option<StateValue> {
    value
        .as_bypass_mode()
        .map(|mode| StateValue::Text(Cow::Borrowed(bypass_mode_name(mode))))
}

pub(crate) fn bypass_mode_name(mode: BypassMode) -> &'static str {
    match mode {
        BypassMode::Close => "close",
        BypassMode::Open => "open",
        BypassMode::Auto => "auto",
        BypassMode::Unknown => "unknown",
    }
}

pub(crate) fn bypass_mode_from_name(name: &str) -> Option<BypassMode> {
    match name {
        "close" => Some(BypassMode::Close),
        "open" => Some(BypassMode::Open),
        "auto" => Some(BypassMode::Auto),
        _ => None,
    }
}

/// Preset name for a ventilation speed, for display.
pub(crate) fn preset_name(speed: VentilationSpeed) -> &'static str {
    PresetMode::from(speed).into()
}

// ── Table ───────────────────────────────────────────────────────────

const PERCENT: Option<&str> = Some("%");
const CELSIUS: Option<&str> = Some("°C");
const PPM: Option<&str> = Some("ppm");
const RPM: Option<&str> = Some("rpm");

const fn sensor(
    property: Property,
    key: &'static str,
    unit: Option<&'static str>,
    decode: Decode,
) -> EntityDescriptor {
    EntityDescriptor {
        property,
        key,
        platform: PlatformSpec::Sensor {
            unit,
            diagnostic: false,
            enabled_by_default: true,
            decode,
        },
    }
}

const fn diagnostic(
    property: Property,
    key: &'static str,
    unit: Option<&'static str>,
    decode: Decode,
) -> EntityDescriptor {
    EntityDescriptor {
        property,
        key,
        platform: PlatformSpec::Sensor {
            unit,
            diagnostic: true,
            enabled_by_default: true,
            decode,
        },
    }
}

const fn hidden_diagnostic(
    property: Property,
    key: &'static str,
    unit: Option<&'static str>,
    decode: Decode,
) -> EntityDescriptor {
    EntityDescriptor {
        property,
        key,
        platform: PlatformSpec::Sensor {
            unit,
            diagnostic: true,
            enabled_by_default: false,
            decode,
        },
    }
}

const fn binary(property: Property, key: &'static str, decode: Decode) -> EntityDescriptor {
    EntityDescriptor {
        property,
        key,
        platform: PlatformSpec::BinarySensor { decode },
    }
}

const fn number(
    property: Property,
    key: &'static str,
    min: f64,
    max: f64,
    unit: Option<&'static str>,
) -> EntityDescriptor {
    EntityDescriptor {
        property,
        key,
        platform: PlatformSpec::Number {
            min,
            max,
            step: 1.0,
            unit,
            write: property,
        },
    }
}

pub static DESCRIPTORS: &[EntityDescriptor] = &[
    // ── Sensors ──
    hidden_diagnostic(
        Property::RfLoadLastHour,
        "rf_load_last_hour",
        PERCENT,
        plain,
    ),
    diagnostic(Property::RfLoadCurrentHour, "rf_load_current_hour", PERCENT, plain),
    hidden_diagnostic(
        Property::MessagesSendLastHour,
        "messages_send_last_hour",
        None,
        plain,
    ),
    diagnostic(
        Property::MessagesSendCurrentHour,
        "messages_send_current_hour",
        None,
        plain,
    ),
    diagnostic(Property::Uptime, "uptime", Some("s"), seconds),
    sensor(Property::TemperatureExhaust, "temperature_exhaust", CELSIUS, temperature),
    sensor(Property::TemperatureInlet, "temperature_inlet", CELSIUS, temperature),
    sensor(Property::TemperatureOutlet, "temperature_outlet", CELSIUS, temperature),
    sensor(Property::TemperatureSupply, "temperature_supply", CELSIUS, temperature),
    diagnostic(Property::FanRpmExhaust, "fan_rpm_exhaust", RPM, plain),
    diagnostic(Property::FanRpmSupply, "fan_rpm_supply", RPM, plain),
    sensor(Property::FanSpeedSupply, "fan_speed_supply", PERCENT, plain),
    sensor(Property::FanSpeedExhaust, "fan_speed_exhaust", PERCENT, plain),
    diagnostic(Property::ErrorCode, "error_code", None, error_code),
    diagnostic(Property::FilterDuration, "filter_duration", Some("d"), plain),
    sensor(
        Property::FilterRemainingPercent,
        "filter_remaining_percent",
        PERCENT,
        plain,
    ),
    sensor(Property::BypassPosition, "bypass_position", PERCENT, bypass_position),
    sensor(Property::Postheater, "postheater", PERCENT, postheater),
    sensor(
        Property::VentilationSpeedOverrideRemainingTime,
        "ventilation_speed_override_remaining_time",
        Some("min"),
        nonzero_minutes,
    ),
    sensor(Property::Co2Level, "co2_level", PPM, co2),
    diagnostic(
        Property::Co2ControlSetpoint,
        "co2_control_setpoint",
        PPM,
        plain,
    ),
    // ── Binary sensors ──
    binary(Property::FaultStatus, "fault_status", fault),
    binary(Property::RfCommStatus, "rf_comm_status", rf_comm),
    binary(Property::FilterDirty, "filter_dirty", flag),
    binary(Property::Defrost, "defrost", flag),
    binary(Property::BatteryStatus, "battery_status", battery_low),
    binary(Property::BasicVentilationEnable, "basic_ventilation_enable", flag),
    // ── Controls ──
    EntityDescriptor {
        property: Property::BasicVentilationEnable,
        key: "basic_ventilation_enable",
        platform: PlatformSpec::Switch {
            write: Property::BasicVentilationEnable,
        },
    },
    EntityDescriptor {
        property: Property::BypassMode,
        key: "bypass_mode",
        platform: PlatformSpec::Select {
            options: &["close", "open", "auto"],
            write: Property::RequestedBypassMode,
        },
    },
    number(
        Property::PreheaterSetpoint,
        "preheater_setpoint",
        -20.0,
        50.0,
        CELSIUS,
    ),
    number(
        Property::FrostProtectionPreheaterSetpoint,
        "frost_protection_preheater_setpoint",
        -20.0,
        50.0,
        CELSIUS,
    ),
    number(
        Property::FreeVentilationHeatingSetpoint,
        "free_ventilation_heating_setpoint",
        0.0,
        30.0,
        CELSIUS,
    ),
    number(
        Property::FreeVentilationCoolingOffset,
        "free_ventilation_cooling_offset",
        1.0,
        10.0,
        None,
    ),
    number(Property::Co2ControlSetpoint, "co2_control_setpoint", 400.0, 2300.0, PPM),
    EntityDescriptor {
        property: Property::FilterReset,
        key: "filter_reset",
        platform: PlatformSpec::Button {
            write: Property::FilterReset,
            press_value: 0,
        },
    },
    EntityDescriptor {
        property: Property::CurrentVentilationSpeed,
        key: "current_ventilation_speed",
        platform: PlatformSpec::Fan,
    },
];
