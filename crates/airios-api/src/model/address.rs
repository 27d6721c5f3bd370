// ── Addressing types ──
//
// Nodes are reached by their bus (Modbus) address; the RF address is the
// stable hardware identity that survives rebinding.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

// ── BusAddress ──────────────────────────────────────────────────────

/// Address of a node on the wired bus.
///
/// Bus addresses are reused after an unbind, so they identify a slot,
/// not a device. Use [`RfAddress`] for identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusAddress(u8);

impl BusAddress {
    /// Addresses the bridge may hand out to newly bound nodes.
    pub const BIND_RANGE: RangeInclusive<u8> = 2..=199;

    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Whether this address lies in the range used for binding.
    pub fn is_bindable(self) -> bool {
        Self::BIND_RANGE.contains(&self.0)
    }
}

impl From<u8> for BusAddress {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── RfAddress ───────────────────────────────────────────────────────

/// Globally unique wireless hardware identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RfAddress(u32);

impl RfAddress {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Hex form used for serial numbers, e.g. `0x01A2B3`.
    pub fn to_hex(self) -> String {
        format!("0x{:06X}", self.0)
    }
}

impl From<u32> for RfAddress {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Decimal, matching the form used in entity unique ids.
impl fmt::Display for RfAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
