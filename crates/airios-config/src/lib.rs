//! Shared configuration for Airios bridge hosts.
//!
//! TOML bridge profiles merged with `AIRIOS_` environment overrides,
//! translation to `airios_api::TransportConfig` and
//! `airios_core::CoordinatorConfig`, and the tracing bootstrap hosts
//! install at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use airios_api::model::{BusAddress, RfAddress};
use airios_api::transport::{DEFAULT_HOST, DEFAULT_PORT};
use airios_api::{Endpoint, TransportConfig};
use airios_core::CoordinatorConfig;
use airios_core::config::{DEFAULT_SCAN_INTERVAL_SECS, SCAN_INTERVAL_RANGE};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no bridge configured (requested: {})", .name.as_deref().unwrap_or("none"))]
    NoBridge { name: Option<String> },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Bridge used when none is named.
    pub default_bridge: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named bridge profiles.
    #[serde(default)]
    pub bridges: HashMap<String, BridgeProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_bridge: Some("default".into()),
            defaults: Defaults::default(),
            bridges: HashMap::new(),
        }
    }
}

impl Config {
    /// Pick a bridge profile: `name` if given, else `default_bridge`,
    /// else the only configured bridge.
    pub fn bridge<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> Result<(&'a str, &'a BridgeProfile), ConfigError> {
        let wanted = name.or(self.default_bridge.as_deref());
        if let Some(wanted) = wanted {
            if let Some((name, profile)) = self.bridges.get_key_value(wanted) {
                return Ok((name.as_str(), profile));
            }
            // An explicit name must exist; a stale default may fall through.
            if name.is_some() {
                return Err(ConfigError::NoBridge {
                    name: Some(wanted.into()),
                });
            }
        }

        let mut bridges = self.bridges.iter();
        match (bridges.next(), bridges.next()) {
            (Some((name, profile)), None) => Ok((name.as_str(), profile)),
            _ => Err(ConfigError::NoBridge {
                name: wanted.map(str::to_owned),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Polling interval in seconds.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,

    #[serde(default)]
    pub fetch_result_status: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            scan_interval: default_scan_interval(),
            fetch_result_status: false,
            timeout: default_timeout(),
        }
    }
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}
fn default_timeout() -> u64 {
    10
}

/// A named bridge profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BridgeProfile {
    /// Transport: "serial" or "network".
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Serial device path (e.g., "/dev/ttyUSB0").
    pub device: Option<String>,

    /// Modbus/TCP gateway host.
    pub host: Option<String>,

    /// Modbus/TCP gateway port.
    pub port: Option<u16>,

    /// Modbus slave address of the bridge.
    #[serde(default = "default_modbus_address")]
    pub modbus_address: u8,

    /// RF address the bridge must report.
    pub rf_address: Option<u32>,

    /// Override the polling interval.
    pub scan_interval: Option<u64>,

    /// Override provenance reads.
    pub fetch_result_status: Option<bool>,

    /// Override the request timeout.
    pub timeout: Option<u64>,
}

fn default_kind() -> String {
    "serial".into()
}
fn default_modbus_address() -> u8 {
    207
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "airios", "airios").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("airios");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Environment keys nest on double underscores:
/// `AIRIOS_DEFAULTS__SCAN_INTERVAL=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AIRIOS_").split("__"));

    let config: Config = figment.extract()?;
    tracing::debug!(path = %path.display(), bridges = config.bridges.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `TransportConfig` from a profile.
pub fn profile_to_transport_config(
    profile: &BridgeProfile,
    defaults: &Defaults,
) -> Result<TransportConfig, ConfigError> {
    let endpoint = match profile.kind.as_str() {
        "serial" => {
            let device = profile
                .device
                .clone()
                .filter(|d| !d.trim().is_empty())
                .ok_or_else(|| invalid("device", "required for serial bridges"))?;
            Endpoint::Serial { device }
        }
        "network" => Endpoint::Network {
            host: profile.host.clone().unwrap_or_else(|| DEFAULT_HOST.into()),
            port: match profile.port {
                Some(0) => return Err(invalid("port", "must be non-zero")),
                Some(port) => port,
                None => DEFAULT_PORT,
            },
        },
        other => {
            return Err(invalid(
                "kind",
                format!("expected 'serial' or 'network', got '{other}'"),
            ));
        }
    };

    if !(1..=247).contains(&profile.modbus_address) {
        return Err(invalid(
            "modbus_address",
            format!("must be between 1 and 247, got {}", profile.modbus_address),
        ));
    }

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(invalid("timeout", "must be at least 1 second"));
    }

    Ok(TransportConfig {
        endpoint,
        bridge_address: BusAddress::new(profile.modbus_address),
        timeout: Duration::from_secs(timeout),
    })
}

/// Build a `CoordinatorConfig` from a profile.
pub fn profile_to_coordinator_config(
    profile: &BridgeProfile,
    defaults: &Defaults,
) -> Result<CoordinatorConfig, ConfigError> {
    let scan_interval = profile.scan_interval.unwrap_or(defaults.scan_interval);
    if !SCAN_INTERVAL_RANGE.contains(&scan_interval) {
        return Err(invalid(
            "scan_interval",
            format!(
                "must be between {} and {} seconds, got {scan_interval}",
                SCAN_INTERVAL_RANGE.start(),
                SCAN_INTERVAL_RANGE.end()
            ),
        ));
    }

    Ok(CoordinatorConfig {
        scan_interval: Duration::from_secs(scan_interval),
        fetch_result_status: profile
            .fetch_result_status
            .unwrap_or(defaults.fetch_result_status),
        expected_bridge_rf: profile.rf_address.map(RfAddress::new),
        ..CoordinatorConfig::default()
    })
}

// ── Tracing ─────────────────────────────────────────────────────────

/// Install the global fmt subscriber. `RUST_LOG` overrides `verbosity`.
pub fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // A host may already have installed a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .try_init();
}
