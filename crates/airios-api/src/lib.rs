// airios-api: Client contract, value model and serialized connection for Airios RF bridges

pub mod client;
pub mod connection;
pub mod error;
#[cfg(feature = "test-util")]
pub mod mock;
pub mod model;
pub mod transport;

pub use client::AiriosClient;
pub use connection::{Connection, DeviceHandle};
pub use error::Error;
pub use transport::{Endpoint, TransportConfig};
