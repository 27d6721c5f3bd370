// ── Property read results ──

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Where the bridge got a value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Held by the bridge itself.
    Local,
    /// Received over RF from the node.
    Rf,
    Unknown,
}

/// Provenance metadata for one property value. Only fetched when the
/// coordinator is configured with `fetch_result_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultStatus {
    /// Time since the value was last refreshed by the bridge.
    pub age: Duration,
    pub source: ResultSource,
    pub flags: u8,
}

/// The outcome of reading one property.
///
/// `value == None` means the property could not be read or decoded. It is
/// "unavailable" and must never be read as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyResult {
    pub value: Option<Value>,
    pub status: Option<ResultStatus>,
}

impl PropertyResult {
    pub fn new(value: Value) -> Self {
        Self {
            value: Some(value),
            status: None,
        }
    }

    /// A result with no decodable value.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: ResultStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

impl From<Value> for PropertyResult {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}
