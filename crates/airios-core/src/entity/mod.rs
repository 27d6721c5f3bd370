// ── Host-facing entities ──
//
// Turns a snapshot into the flat list of entities a host displays, and
// reads each entity's state back out of later snapshots.

mod descriptor;

use std::borrow::Cow;

use airios_api::model::{AiriosData, BusAddress, Node, RfAddress};
use serde::Serialize;
use serde_json::json;
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::CoreError;

pub use descriptor::{DESCRIPTORS, Decode, EntityDescriptor, PlatformSpec, descriptor};
pub(crate) use descriptor::{bypass_mode_from_name, bypass_mode_name};

const MANUFACTURER: &str = "Airios";

/// Entity platform, as the host groups them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    Sensor,
    BinarySensor,
    Switch,
    Select,
    Number,
    Button,
    Fan,
}

/// A displayable state value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(Cow<'static, str>),
}

/// Registry information for the physical device behind an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Stable identifier: the RF address in decimal.
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: String,
    pub serial_number: String,
    pub model_id: String,
    pub sw_version: String,
    /// Identifier of the bridge this device is reached through.
    pub via_device: Option<String>,
}

/// One entity bound to a node.
#[derive(Debug, Clone)]
pub struct Entity {
    pub descriptor: &'static EntityDescriptor,
    pub address: BusAddress,
    pub rf_address: RfAddress,
    pub unique_id: String,
    pub device: DeviceInfo,
}

/// An entity's state in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityState {
    pub available: bool,
    pub value: Option<StateValue>,
    /// Provenance (`age`, `source`, `flags`) when the snapshot carries it.
    pub attributes: Option<serde_json::Value>,
}

impl EntityState {
    fn unavailable() -> Self {
        Self {
            available: false,
            value: None,
            attributes: None,
        }
    }
}

impl Entity {
    pub fn key(&self) -> &'static str {
        self.descriptor.key
    }

    pub fn platform(&self) -> Platform {
        self.descriptor.platform()
    }

    /// Read this entity's state from `data`. Never fails: anything
    /// missing or undecodable makes the entity unavailable.
    pub fn state(&self, data: &AiriosData) -> EntityState {
        let Some(result) = data
            .node(self.address)
            .and_then(|node| node.get(self.descriptor.property))
        else {
            return EntityState::unavailable();
        };
        let Some(value) = result.value() else {
            return EntityState::unavailable();
        };

        let decoded = self.descriptor.decode(value);
        if decoded.is_none() {
            debug!(
                unique_id = %self.unique_id,
                "entity unavailable: value did not decode"
            );
        }
        let attributes = result.status.map(|status| {
            json!({
                "age": format!("{:?}", status.age),
                "source": status.source,
                "flags": status.flags,
            })
        });

        EntityState {
            available: decoded.is_some(),
            value: decoded,
            attributes,
        }
    }
}

/// Build every entity the snapshot supports.
///
/// Fails with `NotReady` when any node lacks an identity property; the
/// host retries on the next refresh.
pub fn materialize(data: &AiriosData) -> Result<Vec<Entity>, CoreError> {
    let bridge_rf = data.bridge().and_then(Node::rf_address);
    let mut entities = Vec::new();

    for node in data.nodes.values() {
        let (rf_address, device) = device_info(node, bridge_rf)?;

        for descriptor in DESCRIPTORS.iter().filter(|d| node.contains(d.property)) {
            let unique_id = format!("{}-{}", rf_address.get(), descriptor.key);
            debug!(key = descriptor.key, %unique_id, "entity materialized");
            entities.push(Entity {
                descriptor,
                address: node.address,
                rf_address,
                unique_id,
                device: device.clone(),
            });
        }
    }

    Ok(entities)
}

/// Device registry information for `node`.
pub fn device_info(
    node: &Node,
    bridge_rf: Option<RfAddress>,
) -> Result<(RfAddress, DeviceInfo), CoreError> {
    let missing = |what: &str| CoreError::NotReady {
        reason: format!("node {} {what} not available", node.address),
    };

    let rf_address = node.rf_address().ok_or_else(|| missing("RF address"))?;
    let product_name = node.product_name().ok_or_else(|| missing("product name"))?;
    let product_id = node.product_id().ok_or_else(|| missing("product ID"))?;
    let sw_version = node
        .software_version()
        .ok_or_else(|| missing("software version"))?;

    let model = if product_name.is_empty() {
        rf_address.to_hex()
    } else {
        product_name.to_owned()
    };

    let info = DeviceInfo {
        identifier: rf_address.get().to_string(),
        name: model.clone(),
        manufacturer: MANUFACTURER,
        model,
        serial_number: rf_address.to_hex(),
        model_id: product_id.to_hex(),
        sw_version: format!("0x{sw_version:04X}"),
        via_device: bridge_rf
            .filter(|bridge| *bridge != rf_address)
            .map(|bridge| bridge.get().to_string()),
    };
    Ok((rf_address, info))
}
