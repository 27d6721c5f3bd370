// Integration tests for binding sessions against a scripted bridge.
#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use airios_api::mock::{BindCall, MockBridge, StatusStep};
use airios_api::model::{
    BindingStatus, BusAddress, DeviceType, ProductId, Property, PropertyResult, RfAddress, Value,
};
use airios_core::{
    BindRequest, BindingError, BindingLimits, BindingState, CoordinatorConfig, CoreError,
};
use pretty_assertions::assert_eq;

use common::{VMD, coordinator, manual_config, node_info, snapshot, started};

// ── Helpers ─────────────────────────────────────────────────────────

const NEW_RF: RfAddress = RfAddress::new(0x0011_2233);

fn controller_request() -> BindRequest {
    BindRequest::Controller {
        product_id: ProductId::VMD_02RPS78,
        rf_serial: None,
    }
}

fn accessory_request() -> BindRequest {
    BindRequest::Accessory {
        controller: VMD,
        product_id: ProductId::VMN_05LM02,
    }
}

/// A bridge with its own slot and the controller at 2 occupied, so the
/// next free address is 3.
fn bridge_with_nodes() -> MockBridge {
    let mock = MockBridge::new(snapshot());
    mock.set_nodes(vec![
        node_info(207, DeviceType::Bridge),
        node_info(2, DeviceType::Controller),
    ]);
    mock.set_read(
        BusAddress::new(3),
        Property::RfAddress,
        PropertyResult::new(Value::Integer(i64::from(NEW_RF.get()))),
    );
    mock
}

fn pending_controller() -> StatusStep {
    StatusStep::Status(BindingStatus::OutgoingBindingInitialized)
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_controller_bind_completes() {
    let mock = bridge_with_nodes();
    mock.script_bind_status([
        pending_controller(),
        pending_controller(),
        pending_controller(),
        StatusStep::Status(BindingStatus::OutgoingBindingCompleted),
    ]);
    let coordinator = started(&mock).await;

    let handle = coordinator.bind(controller_request()).unwrap();
    let progress = handle.progress();
    let bound = handle.wait().await.unwrap();

    assert_eq!(bound.address, BusAddress::new(3));
    assert_eq!(bound.rf_address, NEW_RF);
    assert_eq!(bound.product_id, ProductId::VMD_02RPS78);
    assert_eq!(bound.status, BindingStatus::OutgoingBindingCompleted);
    assert_eq!(*progress.borrow(), BindingState::Done { completed: true });
    assert_eq!(
        mock.binds(),
        vec![BindCall::Controller {
            address: BusAddress::new(3),
            product_id: ProductId::VMD_02RPS78,
            rf_serial: None,
        }]
    );
    assert_eq!(mock.status_polls(), 4);
    assert!(mock.unbinds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_accessory_bind_targets_controller() {
    let mock = bridge_with_nodes();
    mock.script_bind_status([
        StatusStep::Status(BindingStatus::IncomingBindingActive),
        StatusStep::Status(BindingStatus::IncomingBindingCompleted),
    ]);
    let coordinator = started(&mock).await;

    let bound = coordinator
        .bind(accessory_request())
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(bound.address, BusAddress::new(3));
    assert_eq!(
        mock.binds(),
        vec![BindCall::Accessory {
            controller: VMD,
            address: BusAddress::new(3),
            product_id: ProductId::VMN_05LM02,
        }]
    );
}

// ── Failure cleanup ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_controller_timeout_unbinds_once() {
    let mock = bridge_with_nodes();
    mock.script_bind_status([pending_controller()]);
    let coordinator = started(&mock).await;

    let result = coordinator.bind(controller_request()).unwrap().wait().await;

    assert!(
        matches!(
            result,
            Err(BindingError::TimedOut {
                polls: 100,
                last_status: Some(BindingStatus::OutgoingBindingInitialized),
                ..
            })
        ),
        "expected TimedOut, got: {result:?}"
    );
    assert_eq!(mock.status_polls(), 100);
    assert_eq!(mock.unbinds(), vec![BusAddress::new(3)]);
}

#[tokio::test(start_paused = true)]
async fn test_accessory_failure_unbinds_allocated_address() {
    let mock = bridge_with_nodes();
    mock.script_bind_status([
        StatusStep::Status(BindingStatus::IncomingBindingActive),
        StatusStep::Status(BindingStatus::IncomingBindingFailedTimeout),
    ]);
    let coordinator = started(&mock).await;

    let result = coordinator.bind(accessory_request()).unwrap().wait().await;

    assert!(
        matches!(
            result,
            Err(BindingError::Failed {
                status: BindingStatus::IncomingBindingFailedTimeout,
                ..
            })
        ),
        "expected Failed, got: {result:?}"
    );
    assert_eq!(mock.unbinds(), vec![BusAddress::new(3)]);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_bind_needs_no_cleanup() {
    let mock = bridge_with_nodes();
    mock.set_bind_ack(false);
    let coordinator = started(&mock).await;

    let result = coordinator.bind(controller_request()).unwrap().wait().await;

    assert!(
        matches!(result, Err(BindingError::Rejected { .. })),
        "expected Rejected, got: {result:?}"
    );
    assert_eq!(mock.status_polls(), 0);
    assert!(mock.unbinds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_status_unbinds_by_default() {
    let mock = bridge_with_nodes();
    mock.script_bind_status([pending_controller(), StatusStep::Missing]);
    let coordinator = started(&mock).await;

    let result = coordinator.bind(controller_request()).unwrap().wait().await;

    assert!(
        matches!(result, Err(BindingError::StatusUnavailable { .. })),
        "expected StatusUnavailable, got: {result:?}"
    );
    assert_eq!(mock.unbinds(), vec![BusAddress::new(3)]);
}

#[tokio::test(start_paused = true)]
async fn test_poll_error_cleanup_can_be_disabled() {
    let mock = bridge_with_nodes();
    mock.script_bind_status([StatusStep::TransportError]);
    let config = CoordinatorConfig {
        binding: BindingLimits {
            unbind_on_poll_error: false,
            ..BindingLimits::default()
        },
        ..manual_config()
    };
    let coordinator = coordinator(&mock, config);
    coordinator.start().await.unwrap();

    let result = coordinator.bind(controller_request()).unwrap().wait().await;

    assert!(
        matches!(result, Err(BindingError::Transport { .. })),
        "expected Transport, got: {result:?}"
    );
    assert!(mock.unbinds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rf_read_back_failure_keeps_node_bound() {
    let mock = bridge_with_nodes();
    mock.set_read(
        BusAddress::new(3),
        Property::RfAddress,
        PropertyResult::unavailable(),
    );
    mock.script_bind_status([StatusStep::Status(BindingStatus::OutgoingBindingCompleted)]);
    let coordinator = started(&mock).await;

    let result = coordinator.bind(controller_request()).unwrap().wait().await;

    assert!(
        matches!(result, Err(BindingError::RfAddressUnavailable { .. })),
        "expected RfAddressUnavailable, got: {result:?}"
    );
    assert!(mock.unbinds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_no_free_address() {
    let mock = MockBridge::new(snapshot());
    mock.set_nodes(
        BusAddress::BIND_RANGE
            .map(|raw| node_info(raw, DeviceType::Accessory))
            .collect(),
    );
    let coordinator = started(&mock).await;

    let result = coordinator.bind(controller_request()).unwrap().wait().await;

    assert!(
        matches!(result, Err(BindingError::NoAddressAvailable)),
        "expected NoAddressAvailable, got: {result:?}"
    );
    assert!(mock.binds().is_empty());
}

// ── Cancellation ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_cancel_unbinds_once() {
    let mock = bridge_with_nodes();
    mock.script_bind_status([pending_controller()]);
    let coordinator = started(&mock).await;

    let handle = coordinator.bind(controller_request()).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    let result = handle.cancel_and_wait().await;

    assert!(
        matches!(result, Err(BindingError::Cancelled { address: Some(_), .. })),
        "expected Cancelled, got: {result:?}"
    );
    assert_eq!(mock.unbinds(), vec![BusAddress::new(3)]);
}

#[tokio::test(start_paused = true)]
async fn test_completion_beats_cancel_during_poll() {
    let mock = bridge_with_nodes();
    mock.set_status_delay(Duration::from_secs(1));
    mock.script_bind_status([StatusStep::Status(BindingStatus::OutgoingBindingCompleted)]);
    let coordinator = started(&mock).await;

    let handle = coordinator.bind(controller_request()).unwrap();
    // First poll goes out at 250 ms and answers at 1250 ms.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let result = handle.cancel_and_wait().await;

    let bound = result.unwrap();
    assert_eq!(bound.address, BusAddress::new(3));
    assert_eq!(bound.status, BindingStatus::OutgoingBindingCompleted);
    assert_eq!(mock.status_polls(), 1);
    assert!(mock.unbinds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_waits_for_binding_cleanup() {
    let mock = bridge_with_nodes();
    mock.script_bind_status([pending_controller()]);
    let coordinator = started(&mock).await;

    let handle = coordinator.bind(controller_request()).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    drop(handle);
    coordinator.shutdown().await;

    assert_eq!(mock.unbinds(), vec![BusAddress::new(3)]);
    assert_eq!(mock.close_count(), 1);
    let result = coordinator.bind(controller_request());
    assert!(
        matches!(result, Err(CoreError::Disconnected)),
        "expected Disconnected, got: {result:?}"
    );
}

// ── Exclusivity ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_second_bind_is_refused_while_running() {
    let mock = bridge_with_nodes();
    mock.script_bind_status([
        pending_controller(),
        StatusStep::Status(BindingStatus::OutgoingBindingCompleted),
    ]);
    let coordinator = started(&mock).await;

    let first = coordinator.bind(controller_request()).unwrap();
    let second = coordinator.bind(accessory_request());
    assert!(
        matches!(second, Err(CoreError::BindingInProgress)),
        "expected BindingInProgress, got: {second:?}"
    );

    first.wait().await.unwrap();
    // The gate opens again once the session has fully finished.
    tokio::time::sleep(Duration::from_millis(10)).await;
    mock.set_bind_ack(false);
    let third = coordinator.bind(controller_request());
    assert!(third.is_ok(), "expected a new session to start");
}

#[tokio::test(start_paused = true)]
async fn test_binding_and_polling_never_overlap() {
    let mock = bridge_with_nodes();
    mock.set_fetch_delay(Duration::from_millis(300));
    mock.script_bind_status([pending_controller()]);
    let config = CoordinatorConfig {
        scan_interval: Duration::from_secs(15),
        ..CoordinatorConfig::default()
    };
    let coordinator = coordinator(&mock, config);
    coordinator.start().await.unwrap();

    let handle = coordinator.bind(controller_request()).unwrap();
    for _ in 0..5 {
        coordinator.request_refresh();
        tokio::time::sleep(Duration::from_millis(700)).await;
    }
    handle.cancel_and_wait().await.unwrap_err();

    assert!(mock.fetch_count() > 1);
    assert!(mock.status_polls() > 1);
    assert_eq!(mock.max_in_flight(), 1);
}
