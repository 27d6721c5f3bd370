// ── Protocol client contract ──
//
// The seam between the core and a concrete bridge client (Modbus RTU over
// RS-485, or Modbus/TCP). Implementations own the framing and register
// encoding; they must surface connection-level failures as `Error` and
// everything else as absent values.
//
// Implementations need not be safe for concurrent use: `Connection`
// guarantees at most one call is in flight at a time.

use async_trait::async_trait;

use crate::error::Error;
use crate::model::{
    AiriosData, BindingStatus, BusAddress, NodeInfo, ProductId, Property, PropertyResult,
    ResetMode, RfAddress, Value,
};

#[async_trait]
pub trait AiriosClient: Send + Sync {
    /// Read the bridge and every bound node.
    ///
    /// `with_status` additionally reads per-property provenance, which
    /// costs extra round trips.
    async fn fetch(&self, with_status: bool) -> Result<AiriosData, Error>;

    /// The bridge's live node table.
    async fn nodes(&self) -> Result<Vec<NodeInfo>, Error>;

    /// Read one property from one node.
    async fn read(&self, address: BusAddress, property: Property)
    -> Result<PropertyResult, Error>;

    /// Write one property. `Ok(false)` means the node did not accept it.
    async fn write(
        &self,
        address: BusAddress,
        property: Property,
        value: Value,
    ) -> Result<bool, Error>;

    /// Start an outgoing bind to a ventilation unit controller.
    async fn bind_controller(
        &self,
        address: BusAddress,
        product_id: ProductId,
        rf_serial: Option<RfAddress>,
    ) -> Result<bool, Error>;

    /// Start an incoming bind of an accessory to an already bound
    /// controller.
    async fn bind_accessory(
        &self,
        controller: BusAddress,
        address: BusAddress,
        product_id: ProductId,
    ) -> Result<bool, Error>;

    /// Status of the current binding handshake. `Ok(None)` when the
    /// bridge returned no decodable status.
    async fn bind_status(&self) -> Result<Option<BindingStatus>, Error>;

    /// Release the bus slot at `address`.
    async fn unbind(&self, address: BusAddress) -> Result<bool, Error>;

    /// Reset the bridge.
    async fn reset(&self, mode: ResetMode) -> Result<bool, Error>;

    /// Release the underlying transport.
    async fn close(&self);
}
