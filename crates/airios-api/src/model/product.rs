// ── Product identity ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// Vendor product identifier reported by every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u32);

impl ProductId {
    /// RF bridge (RS-485 / Modbus gateway).
    pub const BRDG_02R13: Self = Self(0x0001_C849);
    /// Ventilation unit controller.
    pub const VMD_02RPS78: Self = Self(0x0001_C892);
    /// Ventilation unit controller with CO2 control.
    pub const VMD_07RPS13: Self = Self(0x0001_C883);
    /// Battery powered remote.
    pub const VMN_05LM02: Self = Self(0x0001_C83E);
    /// Wall-mounted remote.
    pub const VMN_02LM11: Self = Self(0x0001_C852);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Short model name for the products the core knows about.
    pub fn model_name(self) -> Option<&'static str> {
        match self {
            Self::BRDG_02R13 => Some("BRDG-02R13"),
            Self::VMD_02RPS78 => Some("VMD-02RPS78"),
            Self::VMD_07RPS13 => Some("VMD-07RPS13"),
            Self::VMN_05LM02 => Some("VMN-05LM02"),
            Self::VMN_02LM11 => Some("VMN-02LM11"),
            _ => None,
        }
    }

    /// Hex form used as model id, e.g. `0x0001C849`.
    pub fn to_hex(self) -> String {
        format!("0x{:08X}", self.0)
    }
}

impl From<u32> for ProductId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.model_name() {
            Some(name) => f.write_str(name),
            None => f.write_str(&self.to_hex()),
        }
    }
}

/// Role of a node on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Bridge,
    /// Ventilation unit controller (VMD); binds outgoing.
    Controller,
    /// Remote or sensor (VMN); binds incoming to a controller.
    Accessory,
}
