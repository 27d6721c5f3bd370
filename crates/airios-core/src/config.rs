// ── Runtime coordinator configuration ──
//
// Describes how often to poll and what to verify about the bridge.
// Never touches disk: the host (or airios-config) builds a
// `CoordinatorConfig` and hands it in.

use std::ops::RangeInclusive;
use std::time::Duration;

use airios_api::model::RfAddress;

use crate::binding::BindingLimits;
use crate::error::CoreError;

/// Allowed polling interval, in seconds.
pub const SCAN_INTERVAL_RANGE: RangeInclusive<u64> = 15..=150;
/// Default polling interval, in seconds.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 30;

/// Configuration for one coordinator (one bridge).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Time between periodic polls. Zero disables periodic polling;
    /// `request_refresh` still works.
    pub scan_interval: Duration,
    /// Also read per-property provenance (age, source, flags). Costs
    /// extra round trips per poll.
    pub fetch_result_status: bool,
    /// RF address the bridge must report; guards against a different
    /// bridge answering at the configured endpoint.
    pub expected_bridge_rf: Option<RfAddress>,
    /// Binding poll timing.
    pub binding: BindingLimits,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_SECS),
            fetch_result_status: false,
            expected_bridge_rf: None,
            binding: BindingLimits::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Check the scan interval against the allowed range.
    pub fn validate(&self) -> Result<(), CoreError> {
        let secs = self.scan_interval.as_secs();
        if self.scan_interval.is_zero() || SCAN_INTERVAL_RANGE.contains(&secs) {
            return Ok(());
        }
        Err(CoreError::ValidationFailed {
            message: format!(
                "scan interval must be between {} and {} seconds, got {secs}",
                SCAN_INTERVAL_RANGE.start(),
                SCAN_INTERVAL_RANGE.end()
            ),
        })
    }
}
