// Integration tests for command routing against a scripted bridge.
#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use airios_api::mock::MockBridge;
use airios_api::model::{
    BusAddress, BypassMode, Property, RequestedVentilationSpeed, ResetMode, RfAddress, Value,
};
use airios_core::{Command, CommandResult, CoreError, FanSpeedPreset, PresetMode};
use pretty_assertions::assert_eq;

use common::{BRIDGE_RF, VMD, coordinator, manual_config, snapshot, started};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockBridge, airios_core::Coordinator) {
    let mock = MockBridge::new(snapshot());
    let coordinator = started(&mock).await;
    (mock, coordinator)
}

fn set_number(key: &str, value: f64) -> Command {
    Command::SetNumber {
        address: VMD,
        key: key.into(),
        value,
    }
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_execute_before_start_is_not_ready() {
    let mock = MockBridge::new(snapshot());
    let coordinator = coordinator(&mock, manual_config());

    let result = coordinator
        .execute(Command::TurnFanOff { address: VMD })
        .await;
    assert!(
        matches!(result, Err(CoreError::NotReady { .. })),
        "expected NotReady, got: {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_execute_after_shutdown_is_disconnected() {
    let (mock, coordinator) = setup().await;
    coordinator.shutdown().await;

    let result = coordinator
        .execute(Command::TurnFanOff { address: VMD })
        .await;
    assert!(
        matches!(result, Err(CoreError::Disconnected)),
        "expected Disconnected, got: {result:?}"
    );
    assert!(mock.writes().is_empty());
}

// ── Entity controls ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_set_number_writes_and_requests_refresh() {
    let (mock, coordinator) = setup().await;

    let result = coordinator
        .execute(set_number("preheater_setpoint", 21.5))
        .await
        .unwrap();

    assert_eq!(result, CommandResult::Applied);
    assert_eq!(
        mock.writes(),
        vec![(VMD, Property::PreheaterSetpoint, Value::Float(21.5))]
    );
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(mock.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_set_number_out_of_range_never_writes() {
    let (mock, coordinator) = setup().await;

    for value in [-20.5, 50.5, f64::NAN] {
        let result = coordinator
            .execute(set_number("preheater_setpoint", value))
            .await;
        assert!(
            matches!(result, Err(CoreError::ValidationFailed { .. })),
            "expected ValidationFailed for {value}, got: {result:?}"
        );
    }
    assert!(mock.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_entity_key() {
    let (mock, coordinator) = setup().await;

    let result = coordinator.execute(set_number("fan_turbo", 1.0)).await;
    assert!(
        matches!(result, Err(CoreError::ValidationFailed { .. })),
        "expected ValidationFailed, got: {result:?}"
    );
    assert!(mock.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_node_and_property() {
    let (_mock, coordinator) = setup().await;

    let result = coordinator
        .execute(Command::TurnFanOff {
            address: BusAddress::new(42),
        })
        .await;
    assert!(
        matches!(result, Err(CoreError::NodeNotFound { .. })),
        "expected NodeNotFound, got: {result:?}"
    );

    let result = coordinator
        .execute(set_number("co2_control_setpoint", 800.0))
        .await;
    assert!(
        matches!(
            result,
            Err(CoreError::PropertyUnsupported {
                property: Property::Co2ControlSetpoint,
                ..
            })
        ),
        "expected PropertyUnsupported, got: {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_select_option() {
    let (mock, coordinator) = setup().await;
    let select = |option: &str| Command::SelectOption {
        address: VMD,
        key: "bypass_mode".into(),
        option: option.into(),
    };

    let result = coordinator.execute(select("close")).await.unwrap();
    assert_eq!(result, CommandResult::Unchanged);

    let result = coordinator.execute(select("open")).await.unwrap();
    assert_eq!(result, CommandResult::Applied);
    assert_eq!(
        mock.writes(),
        vec![(
            VMD,
            Property::RequestedBypassMode,
            Value::BypassMode(BypassMode::Open)
        )]
    );

    let result = coordinator.execute(select("unknown")).await;
    assert!(
        matches!(result, Err(CoreError::ValidationFailed { .. })),
        "expected ValidationFailed, got: {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_switch_and_button() {
    let (mock, coordinator) = setup().await;

    coordinator
        .execute(Command::SetSwitch {
            address: VMD,
            key: "basic_ventilation_enable".into(),
            on: false,
        })
        .await
        .unwrap();
    coordinator
        .execute(Command::PressButton {
            address: VMD,
            key: "filter_reset".into(),
        })
        .await
        .unwrap();

    assert_eq!(
        mock.writes(),
        vec![
            (VMD, Property::BasicVentilationEnable, Value::Integer(0)),
            (VMD, Property::FilterReset, Value::Integer(0)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_unaccepted_write_is_unchanged() {
    let (mock, coordinator) = setup().await;
    mock.set_write_result(false);

    let result = coordinator
        .execute(set_number("preheater_setpoint", 18.0))
        .await
        .unwrap();

    assert_eq!(result, CommandResult::Unchanged);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(mock.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_surfaces() {
    let (mock, coordinator) = setup().await;
    mock.fail_writes();

    let result = coordinator
        .execute(set_number("preheater_setpoint", 18.0))
        .await;
    assert!(result.is_err(), "expected write failure, got: {result:?}");
}

// ── Fan ─────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_fan_presets() {
    let (mock, coordinator) = setup().await;
    let preset = |preset| Command::SetFanPreset {
        address: VMD,
        preset,
    };

    let result = coordinator.execute(preset(PresetMode::Low)).await.unwrap();
    assert_eq!(result, CommandResult::Unchanged);

    coordinator.execute(preset(PresetMode::High)).await.unwrap();
    coordinator
        .execute(preset(PresetMode::MediumOverride))
        .await
        .unwrap();

    assert_eq!(
        mock.writes(),
        vec![
            (
                VMD,
                Property::RequestedVentilationSpeed,
                Value::RequestedVentilationSpeed(RequestedVentilationSpeed::High)
            ),
            (VMD, Property::OverrideTimeSpeedMid, Value::Integer(60)),
        ]
    );

    let result = coordinator.execute(preset(PresetMode::Boost)).await;
    assert!(
        matches!(result, Err(CoreError::ValidationFailed { .. })),
        "expected ValidationFailed, got: {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_fan_on_off() {
    let (mock, coordinator) = setup().await;

    let result = coordinator
        .execute(Command::TurnFanOn {
            address: VMD,
            preset: None,
        })
        .await
        .unwrap();
    assert_eq!(result, CommandResult::Unchanged);

    coordinator
        .execute(Command::TurnFanOff { address: VMD })
        .await
        .unwrap();
    assert_eq!(
        mock.writes(),
        vec![(
            VMD,
            Property::RequestedVentilationSpeed,
            Value::RequestedVentilationSpeed(RequestedVentilationSpeed::Off)
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn test_preset_fan_speeds() {
    let (mock, coordinator) = setup().await;

    coordinator
        .execute(Command::SetPresetFanSpeeds {
            address: VMD,
            preset: FanSpeedPreset::Low,
            supply_percent: 35,
            exhaust_percent: 40,
        })
        .await
        .unwrap();
    assert_eq!(
        mock.writes(),
        vec![
            (VMD, Property::FanSpeedLowSupply, Value::Integer(35)),
            (VMD, Property::FanSpeedLowExhaust, Value::Integer(40)),
        ]
    );

    let result = coordinator
        .execute(Command::SetPresetFanSpeeds {
            address: VMD,
            preset: FanSpeedPreset::High,
            supply_percent: 80,
            exhaust_percent: 80,
        })
        .await;
    assert!(
        matches!(
            result,
            Err(CoreError::PropertyUnsupported {
                property: Property::FanSpeedHighSupply,
                ..
            })
        ),
        "expected PropertyUnsupported, got: {result:?}"
    );

    mock.set_write_result(false);
    let result = coordinator
        .execute(Command::SetPresetFanSpeeds {
            address: VMD,
            preset: FanSpeedPreset::Low,
            supply_percent: 20,
            exhaust_percent: 20,
        })
        .await;
    assert!(
        matches!(result, Err(CoreError::Rejected { .. })),
        "expected Rejected, got: {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_timed_preset() {
    let (mock, coordinator) = setup().await;

    coordinator
        .execute(Command::SetPresetModeDuration {
            address: VMD,
            preset: PresetMode::High,
            minutes: 30,
        })
        .await
        .unwrap();
    assert_eq!(
        mock.writes(),
        vec![(VMD, Property::OverrideTimeSpeedHigh, Value::Integer(30))]
    );

    let result = coordinator
        .execute(Command::SetPresetModeDuration {
            address: VMD,
            preset: PresetMode::Away,
            minutes: 30,
        })
        .await;
    assert!(
        matches!(result, Err(CoreError::ValidationFailed { .. })),
        "expected ValidationFailed, got: {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_filter_rejected() {
    let (mock, coordinator) = setup().await;
    mock.set_write_result(false);

    let result = coordinator
        .execute(Command::ResetFilter { address: VMD })
        .await;
    assert!(
        matches!(result, Err(CoreError::Rejected { .. })),
        "expected Rejected, got: {result:?}"
    );
}

// ── Bridge ──────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_reset_bridge_checks_rf_address() {
    let (mock, coordinator) = setup().await;

    let result = coordinator
        .execute(Command::ResetBridge {
            rf_address: RfAddress::new(0x0000_0001),
            mode: ResetMode::Soft,
        })
        .await;
    assert!(
        matches!(result, Err(CoreError::ValidationFailed { .. })),
        "expected ValidationFailed, got: {result:?}"
    );
    assert!(mock.resets().is_empty());

    let result = coordinator
        .execute(Command::ResetBridge {
            rf_address: BRIDGE_RF,
            mode: ResetMode::Soft,
        })
        .await
        .unwrap();
    assert_eq!(result, CommandResult::Applied);
    assert_eq!(mock.resets(), vec![ResetMode::Soft]);
}
