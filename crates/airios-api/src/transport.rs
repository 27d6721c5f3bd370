// Shared transport configuration for building bridge clients.
//
// Serial (RS-485) and Modbus/TCP clients share the bridge address and
// timeout settings through this module. Framing itself lives in the
// client implementation behind `AiriosClient`.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::BusAddress;

/// Default TCP host of a network-attached bridge.
pub const DEFAULT_HOST: &str = "192.168.1.254";
/// Default Modbus/TCP port.
pub const DEFAULT_PORT: u16 = 502;
/// Default Modbus slave address of the bridge.
pub const DEFAULT_BRIDGE_ADDRESS: BusAddress = BusAddress::new(207);

/// Where the bridge is reachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Endpoint {
    /// RS-485 serial line (e.g. `/dev/ttyUSB0`).
    Serial { device: String },
    /// Modbus/TCP gateway.
    Network { host: String, port: u16 },
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::Network {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial { device } => write!(f, "serial:{device}"),
            Self::Network { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

/// Shared transport configuration for bridge clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub endpoint: Endpoint,
    /// Modbus slave address of the bridge itself.
    pub bridge_address: BusAddress,
    /// Upper bound for one request/response exchange.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            bridge_address: DEFAULT_BRIDGE_ADDRESS,
            timeout: Duration::from_secs(10),
        }
    }
}
