// ── Bridge data model ──
//
// Plain data shared by the client contract and the core: addresses,
// product identity, property ids, decoded values and snapshots.

mod address;
mod binding;
mod node;
mod product;
mod property;
mod result;
mod value;

pub use address::{BusAddress, RfAddress};
pub use binding::{BindingStatus, ResetMode};
pub use node::{AiriosData, Node, NodeInfo};
pub use product::{DeviceType, ProductId};
pub use property::Property;
pub use result::{PropertyResult, ResultSource, ResultStatus};
pub use value::{
    BatteryStatus, BypassMode, BypassPosition, Capabilities, Co2Level, ErrorCode, FaultStatus,
    Heater, HeaterStatus, RequestedVentilationSpeed, SensorStatus, Temperature, Value,
    VentilationSpeed,
};
