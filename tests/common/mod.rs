//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use asset_signal_server::config::AppConfig;

/// Sample config with short cadences, a fixed seed and a temp PKI root
pub fn fast_config(pki_dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::sample();
    config.update.sync_interval_ms = 10;
    config.update.sweep_interval_ms = 15;
    config.update.shutdown_timeout_ms = 1_000;
    config.simulation.seed = Some(1234);
    config.server.pki_root = Some(pki_dir.join("pki"));
    config
}
