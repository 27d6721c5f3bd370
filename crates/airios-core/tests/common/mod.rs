// Shared fixtures for airios-core integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use airios_api::mock::MockBridge;
use airios_api::model::{
    AiriosData, BusAddress, BypassMode, Capabilities, DeviceType, Node, NodeInfo, ProductId,
    Property, RequestedVentilationSpeed, RfAddress, Value, VentilationSpeed,
};
use airios_api::{Connection, TransportConfig};
use airios_core::{Coordinator, CoordinatorConfig};

pub const BRIDGE: BusAddress = BusAddress::new(207);
pub const BRIDGE_RF: RfAddress = RfAddress::new(0x00AB_CDEF);
pub const VMD: BusAddress = BusAddress::new(2);
pub const VMD_RF: RfAddress = RfAddress::new(0x0012_3456);

// ── Snapshots ───────────────────────────────────────────────────────

fn rf_value(rf: RfAddress) -> Value {
    Value::Integer(i64::from(rf.get()))
}

pub fn bridge_node() -> Node {
    Node::new(BRIDGE, DeviceType::Bridge)
        .with(Property::RfAddress, rf_value(BRIDGE_RF))
        .with(
            Property::ProductId,
            Value::Integer(i64::from(ProductId::BRDG_02R13.get())),
        )
        .with(Property::ProductName, Value::from("BRDG-02R13"))
        .with(Property::SoftwareVersion, Value::Integer(0x0204))
}

/// A ventilation unit at `VMD` running at low speed.
pub fn vmd_node() -> Node {
    Node::new(VMD, DeviceType::Controller)
        .with(Property::RfAddress, rf_value(VMD_RF))
        .with(
            Property::ProductId,
            Value::Integer(i64::from(ProductId::VMD_02RPS78.get())),
        )
        .with(Property::ProductName, Value::from("VMD-02RPS78"))
        .with(Property::SoftwareVersion, Value::Integer(0x0100))
        .with(
            Property::CurrentVentilationSpeed,
            Value::VentilationSpeed(VentilationSpeed::Low),
        )
        .with(
            Property::RequestedVentilationSpeed,
            Value::RequestedVentilationSpeed(RequestedVentilationSpeed::Low),
        )
        .with(
            Property::Capabilities,
            Value::Capabilities(Capabilities::OFF_CAPABLE | Capabilities::TIMER_CAPABLE),
        )
        .with(Property::PreheaterSetpoint, Value::Float(16.0))
        .with(Property::BypassMode, Value::BypassMode(BypassMode::Close))
        .with(Property::FanSpeedLowSupply, Value::Integer(30))
        .with(Property::FanSpeedLowExhaust, Value::Integer(30))
        .with(Property::FilterReset, Value::Integer(0))
        .with(Property::BasicVentilationEnable, Value::Integer(1))
}

pub fn snapshot() -> AiriosData {
    AiriosData::new(BRIDGE)
        .with_node(bridge_node())
        .with_node(vmd_node())
}

pub fn node_info(address: u8, device_type: DeviceType) -> NodeInfo {
    NodeInfo {
        address: BusAddress::new(address),
        device_type,
        product_id: None,
        rf_address: None,
    }
}

// ── Coordinators ────────────────────────────────────────────────────

pub fn connection(mock: &MockBridge) -> Arc<Connection> {
    Arc::new(Connection::new(mock.clone(), &TransportConfig::default()))
}

/// Config with periodic polling disabled, so tests drive every refresh.
pub fn manual_config() -> CoordinatorConfig {
    CoordinatorConfig {
        scan_interval: Duration::ZERO,
        ..CoordinatorConfig::default()
    }
}

pub fn coordinator(mock: &MockBridge, config: CoordinatorConfig) -> Coordinator {
    Coordinator::new(connection(mock), config)
}

pub async fn started(mock: &MockBridge) -> Coordinator {
    let coordinator = coordinator(mock, manual_config());
    coordinator.start().await.unwrap();
    coordinator
}
