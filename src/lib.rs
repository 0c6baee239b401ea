//! # Asset Signal Server
//!
//! Keeps a live model of industrial assets and their signals and exposes it
//! as an addressable tree for a protocol-level server. The crate is built
//! around three cooperating pieces:
//!
//! - **Registry**: loads assets once from a [`SignalProvider`](backend::SignalProvider)
//!   and is the single source of truth for signal values
//! - **Address-space bridge**: builds a folder-per-asset, variable-per-signal
//!   tree once and refreshes it from the registry on a fixed cadence
//! - **Update scheduler**: periodically writes simulated values into the registry
//!
//! Both periodic processes run on dedicated threads and only meet in the
//! registry. [`AssetServer`](server::AssetServer) starts and stops them in order.
//!
//! ## Configuration
//!
//! Settings and the initial assets come from a JSON or TOML file (see
//! [`config`]). The default certificate store lives in the platform data
//! directory under `dev.assetsignal.server`:
//!
//! - **Linux**: `~/.local/share/dev.assetsignal.server/pki`
//! - **macOS**: `~/Library/Application Support/dev.assetsignal.server/pki`
//! - **Windows**: `%APPDATA%\dev.assetsignal.server\pki`
//!
//! ## Example
//!
//! ```ignore
//! use asset_signal_server::{
//!     backend::ConfigSignalProvider,
//!     config::AppConfig,
//!     server::{AssetServer, LocalEndpoint},
//! };
//!
//! let config = AppConfig::sample();
//! let provider = ConfigSignalProvider::from_config(&config);
//! let endpoint = LocalEndpoint::new(config.server.clone());
//!
//! let mut server = AssetServer::new(config, Box::new(provider), Box::new(endpoint));
//! server.initialize()?;
//! // ... serve until asked to stop
//! server.shutdown()?;
//! ```

pub mod address_space;
pub mod backend;
pub mod config;
pub mod error;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use address_space::{AddressSpace, AddressSpaceBridge, SharedAddressSpace, SyncReport};
pub use backend::{AssetRegistry, ConfigSignalProvider, SharedRegistry, SignalProvider};
pub use config::AppConfig;
pub use error::{AssetServerError, Result, ResultExt};
pub use server::{AssetServer, ExposureServer, LocalEndpoint, ServerState};
pub use types::{Asset, Quality, Signal, SignalDataType, SignalSample, SignalValue};
