// ── Nodes and snapshots ──
//
// `AiriosData` is the full read of every node at one point in time. It is
// built by the client, then shared read-only as `Arc<AiriosData>`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::address::{BusAddress, RfAddress};
use super::product::{DeviceType, ProductId};
use super::property::Property;
use super::result::PropertyResult;
use super::value::Value;

// ── Node ────────────────────────────────────────────────────────────

/// One bus-addressable device and the properties it reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub address: BusAddress,
    pub device_type: DeviceType,
    pub properties: BTreeMap<Property, PropertyResult>,
}

impl Node {
    pub fn new(address: BusAddress, device_type: DeviceType) -> Self {
        Self {
            address,
            device_type,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style insert, handy for clients assembling a snapshot.
    pub fn with(mut self, property: Property, result: impl Into<PropertyResult>) -> Self {
        self.properties.insert(property, result.into());
        self
    }

    /// Whether the node reports this property at all (value may still be
    /// absent).
    pub fn contains(&self, property: Property) -> bool {
        self.properties.contains_key(&property)
    }

    pub fn get(&self, property: Property) -> Option<&PropertyResult> {
        self.properties.get(&property)
    }

    /// The decoded value, `None` when unsupported or undecodable.
    pub fn value(&self, property: Property) -> Option<&Value> {
        self.get(property).and_then(PropertyResult::value)
    }

    pub fn rf_address(&self) -> Option<RfAddress> {
        self.value(Property::RfAddress)
            .and_then(Value::as_i64)
            .and_then(|raw| u32::try_from(raw).ok())
            .map(RfAddress::new)
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.value(Property::ProductId)
            .and_then(Value::as_i64)
            .and_then(|raw| u32::try_from(raw).ok())
            .map(ProductId::new)
    }

    pub fn product_name(&self) -> Option<&str> {
        self.value(Property::ProductName).and_then(Value::as_str)
    }

    pub fn software_version(&self) -> Option<u16> {
        self.value(Property::SoftwareVersion)
            .and_then(Value::as_i64)
            .and_then(|raw| u16::try_from(raw).ok())
    }
}

// ── NodeInfo ────────────────────────────────────────────────────────

/// One entry of the bridge's live node table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub address: BusAddress,
    pub device_type: DeviceType,
    pub product_id: Option<ProductId>,
    pub rf_address: Option<RfAddress>,
}

// ── AiriosData ──────────────────────────────────────────────────────

/// Immutable snapshot: bus address → node, plus the bridge's address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiriosData {
    pub bridge_address: BusAddress,
    pub nodes: BTreeMap<BusAddress, Node>,
}

impl AiriosData {
    pub fn new(bridge_address: BusAddress) -> Self {
        Self {
            bridge_address,
            nodes: BTreeMap::new(),
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.insert(node.address, node);
        self
    }

    pub fn node(&self, address: BusAddress) -> Option<&Node> {
        self.nodes.get(&address)
    }

    pub fn bridge(&self) -> Option<&Node> {
        self.node(self.bridge_address)
    }

    /// Find a node by its RF address.
    pub fn node_by_rf(&self, rf: RfAddress) -> Option<&Node> {
        self.nodes.values().find(|n| n.rf_address() == Some(rf))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
