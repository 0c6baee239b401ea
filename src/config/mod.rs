//! Configuration module for the asset signal server
//!
//! This module handles application configuration including:
//! - The `assets` section: asset names mapped to signal names and raw values
//! - Server, update cadence, simulation and logging settings
//! - Locating, loading and saving the config file (JSON or TOML)
//!
//! # Config Location
//!
//! The binary looks for its config file in this order:
//! 1. The first command line argument
//! 2. The `ASSET_SERVER_CONFIG` environment variable
//! 3. `appsettings.json` or `appsettings.toml` in the working directory
//!
//! When none exists the built-in [`AppConfig::sample`] is used.
//!
//! # Example
//!
//! ```json
//! {
//!   "server": { "endpoint_url": "opc.tcp://0.0.0.0:4840" },
//!   "update": { "sweep_interval_ms": 5000 },
//!   "assets": {
//!     "RoboticWelder_01": { "Current": 152.5, "ArcOn": true, "Mode": "Auto" }
//!   }
//! }
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{AssetServerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.assetsignal.server";

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ASSET_SERVER_CONFIG";

/// Config file names probed in the working directory
pub const DEFAULT_CONFIG_FILES: &[&str] = &["appsettings.json", "appsettings.toml"];

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

// ==================== Raw signal values ====================

/// A configured signal value as written in the config file.
///
/// Every variant is turned back into text before type inference, so a
/// number written as `100.0` and a string written as `"100.0"` behave the same.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl ConfigValue {
    /// Text form handed to value inference
    pub fn to_raw_string(&self) -> String {
        match self {
            ConfigValue::Bool(v) => v.to_string(),
            ConfigValue::Integer(v) => v.to_string(),
            // Debug keeps the fractional part (`100.0`), Display would drop it
            ConfigValue::Float(v) => format!("{:?}", v),
            ConfigValue::Text(v) => v.clone(),
        }
    }
}

/// Signal name to raw value; `null` entries are kept so they can be reported
pub type SignalDefinitions = BTreeMap<String, Option<ConfigValue>>;

/// Asset name to its signal definitions
pub type AssetDefinitions = BTreeMap<String, SignalDefinitions>;

// ==================== App Config ====================

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Exposure layer settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Periodic task cadences
    #[serde(default)]
    pub update: UpdateConfig,

    /// Simulated value source
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Initial asset and signal definitions
    #[serde(default)]
    pub assets: AssetDefinitions,
}

impl AppConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the config file to use, if any
    pub fn resolve_path(cli_arg: Option<PathBuf>) -> Option<PathBuf> {
        if let Some(path) = cli_arg {
            return Some(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    /// Load a config file; `.toml` files are parsed as TOML, everything else as JSON
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AssetServerError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = if is_toml(path) {
            toml::from_str(&content).map_err(|e| {
                AssetServerError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                AssetServerError::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save the config to disk, format chosen by extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AssetServerError::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = if is_toml(path) {
            toml::to_string_pretty(self)
                .map_err(|e| AssetServerError::Serialization(e.to_string()))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| AssetServerError::Serialization(e.to_string()))?
        };

        std::fs::write(path, content).map_err(|e| {
            AssetServerError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Check values that would otherwise fail late at startup
    pub fn validate(&self) -> Result<()> {
        if self.server.application_name.trim().is_empty() {
            return Err(AssetServerError::Config(
                "server.application_name cannot be empty".to_string(),
            ));
        }

        if self.server.endpoint_host_port().is_none() {
            return Err(AssetServerError::Config(format!(
                "server.endpoint_url '{}' is not of the form opc.tcp://host:port",
                self.server.endpoint_url
            )));
        }

        for (field, value) in [
            ("update.sync_interval_ms", self.update.sync_interval_ms),
            ("update.sweep_interval_ms", self.update.sweep_interval_ms),
            ("update.shutdown_timeout_ms", self.update.shutdown_timeout_ms),
        ] {
            if value == 0 {
                return Err(AssetServerError::Config(format!(
                    "{} must be greater than zero",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Number of configured signals across all assets
    pub fn signal_count(&self) -> usize {
        self.assets.values().map(|signals| signals.len()).sum()
    }

    /// Create a sample configuration with a few demo assets
    pub fn sample() -> Self {
        let mut config = Self::default();

        let welder: SignalDefinitions = [
            ("ArcOn", ConfigValue::Bool(false)),
            ("Current", ConfigValue::Float(152.5)),
            ("Mode", ConfigValue::Text("Auto".to_string())),
            ("Voltage", ConfigValue::Float(24.8)),
            ("WeldCount", ConfigValue::Integer(1200)),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), Some(value)))
        .collect();

        let conveyor: SignalDefinitions = [
            ("ItemCount", ConfigValue::Integer(0)),
            ("Running", ConfigValue::Bool(true)),
            ("Speed", ConfigValue::Float(1.25)),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), Some(value)))
        .collect();

        let press: SignalDefinitions = [
            ("Pressure", ConfigValue::Float(87.3)),
            ("Status", ConfigValue::Text("Idle".to_string())),
            ("StrokeCount", ConfigValue::Integer(42)),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), Some(value)))
        .collect();

        config.assets.insert("RoboticWelder_01".to_string(), welder);
        config.assets.insert("Conveyor_01".to_string(), conveyor);
        config.assets.insert("HydraulicPress_01".to_string(), press);

        config
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

// ==================== Tests ====================
