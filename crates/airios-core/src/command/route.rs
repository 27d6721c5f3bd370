// ── Command routing ──
//
// Each command is checked against the current snapshot first, so
// invalid requests never reach the bridge.

use airios_api::Connection;
use airios_api::model::{AiriosData, BusAddress, Capabilities, Node, Property, Value};
use tracing::{debug, info};

use super::{Command, CommandResult};
use crate::coordinator::Coordinator;
use crate::entity::{
    EntityDescriptor, Platform, PlatformSpec, bypass_mode_from_name, bypass_mode_name, descriptor,
};
use crate::error::CoreError;
use crate::fan::{OVERRIDE_MINUTES, PresetMode, available_presets};

/// Route a command to the bridge.
#[allow(clippy::too_many_lines)]
pub(crate) async fn route_command(
    coordinator: &Coordinator,
    cmd: Command,
) -> Result<CommandResult, CoreError> {
    let connection: &Connection = coordinator.connection();
    let snapshot = coordinator.data().ok_or_else(|| CoreError::NotReady {
        reason: "no snapshot yet".into(),
    })?;
    debug!(?cmd, "routing command");

    match cmd {
        // ── Entity controls ──────────────────────────────────────────
        Command::SetNumber {
            address,
            key,
            value,
        } => {
            let Some(EntityDescriptor {
                property,
                platform:
                    PlatformSpec::Number {
                        min,
                        max,
                        write: target,
                        ..
                    },
                ..
            }) = descriptor(Platform::Number, &key)
            else {
                return Err(unknown_entity(Platform::Number, &key));
            };
            if !value.is_finite() || value < *min || value > *max {
                return Err(CoreError::ValidationFailed {
                    message: format!("{key} must be between {min} and {max}, got {value}"),
                });
            }
            require(&snapshot, address, &[*property])?;
            write(connection, address, *target, Value::Float(value)).await
        }

        Command::SelectOption {
            address,
            key,
            option,
        } => {
            let Some(EntityDescriptor {
                property,
                platform:
                    PlatformSpec::Select {
                        options,
                        write: target,
                    },
                ..
            }) = descriptor(Platform::Select, &key)
            else {
                return Err(unknown_entity(Platform::Select, &key));
            };
            let mode = bypass_mode_from_name(&option)
                .filter(|_| options.iter().any(|o| *o == option))
                .ok_or_else(|| CoreError::ValidationFailed {
                    message: format!("{key}: unknown option {option:?}"),
                })?;
            let node = require(&snapshot, address, &[*property])?;

            let current = node
                .value(*property)
                .and_then(Value::as_bypass_mode)
                .map(bypass_mode_name);
            if current == Some(option.as_str()) {
                return Ok(CommandResult::Unchanged);
            }
            write(connection, address, *target, Value::BypassMode(mode)).await
        }

        Command::SetSwitch { address, key, on } => {
            let Some(EntityDescriptor {
                property,
                platform: PlatformSpec::Switch { write: target },
                ..
            }) = descriptor(Platform::Switch, &key)
            else {
                return Err(unknown_entity(Platform::Switch, &key));
            };
            require(&snapshot, address, &[*property])?;
            write(connection, address, *target, Value::Integer(i64::from(on))).await
        }

        Command::PressButton { address, key } => {
            let Some(EntityDescriptor {
                property,
                platform:
                    PlatformSpec::Button {
                        write: target,
                        press_value,
                    },
                ..
            }) = descriptor(Platform::Button, &key)
            else {
                return Err(unknown_entity(Platform::Button, &key));
            };
            require(&snapshot, address, &[*property])?;
            debug!(%address, %key, "button pressed");
            write(connection, address, *target, Value::Integer(*press_value)).await
        }

        // ── Fan ──────────────────────────────────────────────────────
        Command::SetFanPreset { address, preset } => {
            let node = require(&snapshot, address, &[Property::CurrentVentilationSpeed])?;
            set_preset(connection, node, preset).await
        }

        Command::TurnFanOn { address, preset } => {
            let node = require(&snapshot, address, &[Property::CurrentVentilationSpeed])?;
            if current_preset(node).is_some_and(PresetMode::is_on) {
                return Ok(CommandResult::Unchanged);
            }
            set_preset(connection, node, preset.unwrap_or(PresetMode::Medium)).await
        }

        Command::TurnFanOff { address } => {
            let node = require(&snapshot, address, &[Property::CurrentVentilationSpeed])?;
            if !current_preset(node).is_some_and(PresetMode::is_on) {
                return Ok(CommandResult::Unchanged);
            }
            set_preset(connection, node, PresetMode::Off).await
        }

        Command::SetPresetFanSpeeds {
            address,
            preset,
            supply_percent,
            exhaust_percent,
        } => {
            let (supply, exhaust) = preset.properties();
            require(&snapshot, address, &[supply, exhaust])?;
            if supply_percent > 100 || exhaust_percent > 100 {
                return Err(CoreError::ValidationFailed {
                    message: format!(
                        "fan speeds must be percentages, got supply={supply_percent} exhaust={exhaust_percent}"
                    ),
                });
            }
            info!(
                %address,
                %preset,
                supply_percent,
                exhaust_percent,
                "setting preset fan speeds"
            );
            let device = connection.node(address);
            if !device.set(supply, i64::from(supply_percent)).await? {
                return Err(CoreError::Rejected {
                    message: format!("failed to set supply fan speed to {supply_percent}"),
                });
            }
            if !device.set(exhaust, i64::from(exhaust_percent)).await? {
                return Err(CoreError::Rejected {
                    message: format!("failed to set exhaust fan speed to {exhaust_percent}"),
                });
            }
            Ok(CommandResult::Applied)
        }

        Command::SetPresetModeDuration {
            address,
            preset,
            minutes,
        } => {
            let node = require(
                &snapshot,
                address,
                &[Property::RequestedVentilationSpeed, Property::Capabilities],
            )?;
            let timed = node
                .value(Property::Capabilities)
                .and_then(Value::as_capabilities)
                .is_some_and(|caps| caps.contains(Capabilities::TIMER_CAPABLE));
            if !timed {
                return Err(CoreError::Rejected {
                    message: format!("node {address} does not support timed presets"),
                });
            }
            let timer = preset
                .duration_timer()
                .ok_or_else(|| CoreError::ValidationFailed {
                    message: format!("timed override not available for preset {preset}"),
                })?;
            info!(%address, %preset, minutes, "setting timed preset");
            write(connection, address, timer, Value::Integer(minutes.into())).await
        }

        Command::ResetFilter { address } => {
            require(&snapshot, address, &[Property::FilterReset])?;
            info!(%address, "resetting filter dirty flag");
            if !connection
                .node(address)
                .set(Property::FilterReset, 0_i64)
                .await?
            {
                return Err(CoreError::Rejected {
                    message: "failed to reset filter dirty flag".into(),
                });
            }
            Ok(CommandResult::Applied)
        }

        // ── Bridge ───────────────────────────────────────────────────
        Command::ResetBridge { rf_address, mode } => {
            let actual = connection.bridge().rf_address().await?;
            if actual != Some(rf_address) {
                return Err(CoreError::ValidationFailed {
                    message: format!(
                        "bridge RF address mismatch: requested {}, connected {}",
                        rf_address.to_hex(),
                        actual.map_or_else(|| "unknown".to_owned(), |rf| rf.to_hex())
                    ),
                });
            }
            info!(rf_address = %rf_address.to_hex(), ?mode, "resetting bridge");
            if connection.reset(mode).await? {
                Ok(CommandResult::Applied)
            } else {
                Err(CoreError::Rejected {
                    message: "bridge refused reset".into(),
                })
            }
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn unknown_entity(platform: Platform, key: &str) -> CoreError {
    CoreError::ValidationFailed {
        message: format!("no {platform} entity named {key:?}"),
    }
}

/// The node at `address`, which must report every property in `props`.
fn require<'a>(
    snapshot: &'a AiriosData,
    address: BusAddress,
    props: &[Property],
) -> Result<&'a Node, CoreError> {
    let node = snapshot
        .node(address)
        .ok_or(CoreError::NodeNotFound { address })?;
    if let Some(&property) = props.iter().find(|p| !node.contains(**p)) {
        return Err(CoreError::PropertyUnsupported { address, property });
    }
    Ok(node)
}

async fn write(
    connection: &Connection,
    address: BusAddress,
    property: Property,
    value: Value,
) -> Result<CommandResult, CoreError> {
    let accepted = connection.node(address).set(property, value).await?;
    debug!(%address, %property, accepted, "write");
    Ok(CommandResult::from_write(accepted))
}

fn current_preset(node: &Node) -> Option<PresetMode> {
    node.value(Property::CurrentVentilationSpeed)
        .and_then(Value::as_ventilation_speed)
        .map(PresetMode::from)
}

async fn set_preset(
    connection: &Connection,
    node: &Node,
    preset: PresetMode,
) -> Result<CommandResult, CoreError> {
    if current_preset(node) == Some(preset) {
        return Ok(CommandResult::Unchanged);
    }

    let capabilities = node
        .value(Property::Capabilities)
        .and_then(Value::as_capabilities);
    if !available_presets(capabilities).contains(&preset) {
        return Err(CoreError::ValidationFailed {
            message: format!("preset {preset} not supported by node {}", node.address),
        });
    }

    info!(address = %node.address, %preset, "setting fan preset");
    let address = node.address;
    match preset.override_timer() {
        Some(timer) => write(connection, address, timer, Value::Integer(OVERRIDE_MINUTES)).await,
        None => {
            let speed = Value::RequestedVentilationSpeed(preset.requested_speed());
            write(
                connection,
                address,
                Property::RequestedVentilationSpeed,
                speed,
            )
            .await
        }
    }
}
