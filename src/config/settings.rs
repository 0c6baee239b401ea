//! Configuration sections for the server, the periodic tasks and logging
//!
//! Each section deserializes with defaults for every missing field, so a
//! config file only needs to mention what it changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::app_data_dir;

/// Default endpoint the exposure layer listens on
pub const DEFAULT_ENDPOINT_URL: &str = "opc.tcp://localhost:4840";

/// Default application name
pub const DEFAULT_APPLICATION_NAME: &str = "AssetSignalServer";

/// Default namespace for exposed nodes
pub const DEFAULT_NAMESPACE_URI: &str = "urn:asset-signal-server:assets";

/// Default address-space sync cadence in milliseconds
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 1_000;

/// Default simulation sweep cadence in milliseconds
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 5_000;

/// Default bound on waiting for a periodic task to stop
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 2_000;

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,asset_signal_server=debug";

// ==================== Server ====================

/// Settings handed to the exposure layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Application name announced by the endpoint
    pub application_name: String,

    /// Application URI
    pub application_uri: String,

    /// Endpoint URL (`opc.tcp://host:port`)
    pub endpoint_url: String,

    /// Namespace the asset nodes live in
    pub namespace_uri: String,

    /// Root of the certificate store (`own`, `trusted`, `issuer`, `rejected`)
    pub pki_root: Option<PathBuf>,

    /// Accept client certificates that are not in the trusted store
    pub auto_accept_untrusted: bool,

    /// Operation timeout in milliseconds
    pub operation_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            application_uri: format!("urn:localhost:{}", DEFAULT_APPLICATION_NAME),
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            namespace_uri: DEFAULT_NAMESPACE_URI.to_string(),
            pki_root: None,
            auto_accept_untrusted: true,
            operation_timeout_ms: 15_000,
        }
    }
}

impl ServerConfig {
    /// Resolve the PKI root: configured path, else `<data dir>/pki`, else `./pki`
    pub fn pki_root(&self) -> PathBuf {
        self.pki_root
            .clone()
            .or_else(|| app_data_dir().map(|dir| dir.join("pki")))
            .unwrap_or_else(|| PathBuf::from("pki"))
    }

    /// Split `opc.tcp://host:port` into host and port
    pub fn endpoint_host_port(&self) -> Option<(String, u16)> {
        let rest = self.endpoint_url.strip_prefix("opc.tcp://")?;
        let authority = rest.split('/').next()?;
        let (host, port) = authority.rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        let port = port.parse::<u16>().ok()?;
        Some((host.to_string(), port))
    }
}

// ==================== Update cadence ====================

/// Cadences of the two periodic tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Address-space sync tick interval in milliseconds
    pub sync_interval_ms: u64,

    /// Simulation sweep interval in milliseconds
    pub sweep_interval_ms: u64,

    /// How long shutdown waits for a task's current iteration
    pub shutdown_timeout_ms: u64,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl UpdateConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

// ==================== Simulation ====================

/// Simulated value source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Run the simulation sweeps at all
    pub enabled: bool,

    /// Fixed RNG seed for reproducible runs (random when unset)
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: None,
        }
    }
}

// ==================== Logging ====================

/// Logging settings applied by the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,

    /// Directory for daily rolling log files (console only when unset)
    pub directory: Option<PathBuf>,

    /// Log file name prefix
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            directory: None,
            file_prefix: "asset-signal-server.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_host_port() {
        let config = ServerConfig::default();
        assert_eq!(
            config.endpoint_host_port(),
            Some(("localhost".to_string(), 4840))
        );
    }

    #[test]
    fn test_endpoint_host_port_rejects_bad_urls() {
        for url in [
            "http://localhost:4840",
            "opc.tcp://localhost",
            "opc.tcp://:4840",
            "opc.tcp://localhost:notaport",
        ] {
            let config = ServerConfig {
                endpoint_url: url.to_string(),
                ..Default::default()
            };
            assert!(config.endpoint_host_port().is_none(), "{url}");
        }
    }

    #[test]
    fn test_configured_pki_root_wins() {
        let config = ServerConfig {
            pki_root: Some(PathBuf::from("/tmp/pki-test")),
            ..Default::default()
        };
        assert_eq!(config.pki_root(), PathBuf::from("/tmp/pki-test"));
    }

    #[test]
    fn test_update_durations() {
        let update = UpdateConfig::default();
        assert_eq!(update.sync_interval(), Duration::from_secs(1));
        assert_eq!(update.sweep_interval(), Duration::from_secs(5));
    }
}
