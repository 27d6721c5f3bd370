// ── Serialized bridge connection ──
//
// The bridge speaks strict request/response over a single serial line or
// socket. Every flow (periodic refresh, binding, entity writes) goes
// through this one `Connection`, which holds its mutex for exactly one
// round trip so frames from different flows never interleave.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::client::AiriosClient;
use crate::error::Error;
use crate::model::{
    AiriosData, BindingStatus, BusAddress, NodeInfo, ProductId, Property, PropertyResult,
    ResetMode, RfAddress, Value,
};
use crate::transport::TransportConfig;

/// Exclusive owner of the bridge client.
pub struct Connection {
    client: Mutex<Box<dyn AiriosClient>>,
    bridge_address: BusAddress,
    timeout: Duration,
    closed: AtomicBool,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("bridge_address", &self.bridge_address)
            .field("timeout", &self.timeout)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(client: impl AiriosClient + 'static, config: &TransportConfig) -> Self {
        Self::from_boxed(Box::new(client), config)
    }

    pub fn from_boxed(client: Box<dyn AiriosClient>, config: &TransportConfig) -> Self {
        Self {
            client: Mutex::new(client),
            bridge_address: config.bridge_address,
            timeout: config.timeout,
            closed: AtomicBool::new(false),
        }
    }

    pub fn bridge_address(&self) -> BusAddress {
        self.bridge_address
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // ── Request plumbing ─────────────────────────────────────────────

    async fn lock(&self) -> Result<MutexGuard<'_, Box<dyn AiriosClient>>, Error> {
        let guard = self.client.lock().await;
        if self.is_closed() {
            return Err(Error::Closed);
        }
        Ok(guard)
    }

    async fn timed<T>(&self, request: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| Error::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }

    // ── Bridge-wide operations ───────────────────────────────────────

    pub async fn fetch(&self, with_status: bool) -> Result<AiriosData, Error> {
        let client = self.lock().await?;
        self.timed(client.fetch(with_status)).await
    }

    pub async fn nodes(&self) -> Result<Vec<NodeInfo>, Error> {
        let client = self.lock().await?;
        self.timed(client.nodes()).await
    }

    pub async fn bind_controller(
        &self,
        address: BusAddress,
        product_id: ProductId,
        rf_serial: Option<RfAddress>,
    ) -> Result<bool, Error> {
        debug!(%address, %product_id, ?rf_serial, "bind controller");
        let client = self.lock().await?;
        self.timed(client.bind_controller(address, product_id, rf_serial))
            .await
    }

    pub async fn bind_accessory(
        &self,
        controller: BusAddress,
        address: BusAddress,
        product_id: ProductId,
    ) -> Result<bool, Error> {
        debug!(%controller, %address, %product_id, "bind accessory");
        let client = self.lock().await?;
        self.timed(client.bind_accessory(controller, address, product_id))
            .await
    }

    pub async fn bind_status(&self) -> Result<Option<BindingStatus>, Error> {
        let client = self.lock().await?;
        self.timed(client.bind_status()).await
    }

    pub async fn unbind(&self, address: BusAddress) -> Result<bool, Error> {
        debug!(%address, "unbind");
        let client = self.lock().await?;
        self.timed(client.unbind(address)).await
    }

    pub async fn reset(&self, mode: ResetMode) -> Result<bool, Error> {
        debug!(?mode, "reset bridge");
        let client = self.lock().await?;
        self.timed(client.reset(mode)).await
    }

    // ── Per-node access ──────────────────────────────────────────────

    /// Handle for reading and writing one node's properties.
    pub fn node(&self, address: BusAddress) -> DeviceHandle<'_> {
        DeviceHandle {
            connection: self,
            address,
        }
    }

    /// Handle for the bridge itself.
    pub fn bridge(&self) -> DeviceHandle<'_> {
        self.node(self.bridge_address)
    }

    /// Close the transport. Only the first call reaches the client;
    /// every request after it fails with [`Error::Closed`].
    pub async fn close(&self) {
        let client = self.client.lock().await;
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        client.close().await;
        debug!("connection closed");
    }
}

// ── DeviceHandle ────────────────────────────────────────────────────

/// Borrowed view of one node, reached through the shared connection.
#[derive(Debug, Clone, Copy)]
pub struct DeviceHandle<'a> {
    connection: &'a Connection,
    address: BusAddress,
}

impl DeviceHandle<'_> {
    pub fn address(&self) -> BusAddress {
        self.address
    }

    pub async fn get(&self, property: Property) -> Result<PropertyResult, Error> {
        let client = self.connection.lock().await?;
        self.connection
            .timed(client.read(self.address, property))
            .await
    }

    /// Write one property. `Ok(false)` means the node refused it.
    pub async fn set(&self, property: Property, value: impl Into<Value>) -> Result<bool, Error> {
        let value = value.into();
        debug!(address = %self.address, %property, ?value, "write property");
        let client = self.connection.lock().await?;
        self.connection
            .timed(client.write(self.address, property, value))
            .await
    }

    /// Read the node's RF address directly from the bridge.
    pub async fn device_rf_address(&self) -> Result<PropertyResult, Error> {
        self.get(Property::RfAddress).await
    }

    /// Decoded form of [`device_rf_address`](Self::device_rf_address).
    pub async fn rf_address(&self) -> Result<Option<RfAddress>, Error> {
        let result = self.device_rf_address().await?;
        Ok(result
            .value()
            .and_then(Value::as_i64)
            .and_then(|raw| u32::try_from(raw).ok())
            .map(RfAddress::new))
    }

    pub async fn product_id(&self) -> Result<Option<ProductId>, Error> {
        let result = self.get(Property::ProductId).await?;
        Ok(result
            .value()
            .and_then(Value::as_i64)
            .and_then(|raw| u32::try_from(raw).ok())
            .map(ProductId::new))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::DeviceType;

    // ── Helpers ─────────────────────────────────────────────────────

    /// Client that sleeps inside every call and records overlap.
    #[derive(Default)]
    struct SlowClient {
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
        closes: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl SlowClient {
        async fn enter(&self) {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AiriosClient for SlowClient {
        async fn fetch(&self, _with_status: bool) -> Result<AiriosData, Error> {
            self.enter().await;
            Ok(AiriosData::new(BusAddress::new(207)))
        }

        async fn nodes(&self) -> Result<Vec<NodeInfo>, Error> {
            self.enter().await;
            Ok(vec![NodeInfo {
                address: BusAddress::new(2),
                device_type: DeviceType::Controller,
                product_id: None,
                rf_address: None,
            }])
        }

        async fn read(
            &self,
            _address: BusAddress,
            _property: Property,
        ) -> Result<PropertyResult, Error> {
            self.enter().await;
            Ok(PropertyResult::new(Value::Integer(0x12_3456)))
        }

        async fn write(
            &self,
            _address: BusAddress,
            _property: Property,
            _value: Value,
        ) -> Result<bool, Error> {
            self.enter().await;
            Ok(true)
        }

        async fn bind_controller(
            &self,
            _address: BusAddress,
            _product_id: ProductId,
            _rf_serial: Option<RfAddress>,
        ) -> Result<bool, Error> {
            Ok(true)
        }

        async fn bind_accessory(
            &self,
            _controller: BusAddress,
            _address: BusAddress,
            _product_id: ProductId,
        ) -> Result<bool, Error> {
            Ok(true)
        }

        async fn bind_status(&self) -> Result<Option<BindingStatus>, Error> {
            Ok(None)
        }

        async fn unbind(&self, _address: BusAddress) -> Result<bool, Error> {
            Ok(true)
        }

        async fn reset(&self, _mode: ResetMode) -> Result<bool, Error> {
            Ok(true)
        }

        async fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn config(timeout: Duration) -> TransportConfig {
        TransportConfig {
            timeout,
            ..TransportConfig::default()
        }
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn concurrent_requests_never_overlap() {
        let client = SlowClient {
            delay: Duration::from_millis(50),
            ..SlowClient::default()
        };
        let max = Arc::clone(&client.max_in_flight);
        let conn = Arc::new(Connection::new(client, &config(Duration::from_secs(5))));

        let a = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.fetch(false).await })
        };
        let b = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.nodes().await })
        };
        let c = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.node(BusAddress::new(2)).set(Property::FilterReset, 0_i64).await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
        assert!(c.await.unwrap().unwrap());
        assert_eq!(max.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_request_times_out() {
        let client = SlowClient {
            delay: Duration::from_secs(30),
            ..SlowClient::default()
        };
        let conn = Connection::new(client, &config(Duration::from_secs(1)));

        let result = conn.fetch(true).await;
        assert!(
            matches!(result, Err(Error::Timeout { timeout_ms: 1000 })),
            "expected Timeout, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn close_is_idempotent_and_final() {
        let client = SlowClient::default();
        let closes = Arc::clone(&client.closes);
        let conn = Connection::new(client, &config(Duration::from_secs(1)));

        conn.close().await;
        conn.close().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(conn.is_closed());

        let result = conn.nodes().await;
        assert!(matches!(result, Err(Error::Closed)), "got: {result:?}");
    }

    #[tokio::test]
    async fn device_handle_decodes_rf_address() {
        let conn = Connection::new(SlowClient::default(), &config(Duration::from_secs(1)));
        let rf = conn.node(BusAddress::new(2)).rf_address().await.unwrap();
        assert_eq!(rf, Some(RfAddress::new(0x12_3456)));
        assert_eq!(conn.bridge().address(), BusAddress::new(207));
    }
}
