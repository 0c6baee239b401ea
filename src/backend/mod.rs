//! Backend: asset loading, the registry and the value update scheduler
//!
//! Everything here runs off the main thread or is shared with threads that
//! do. The registry is the only state shared between components; it is
//! handed out as an [`SharedRegistry`] (`Arc<AssetRegistry>`).
//!
//! # Components
//!
//! - [`SignalProvider`] / [`ConfigSignalProvider`] - Supply the initial assets
//! - [`AssetRegistry`] - Load-once, name-keyed cache of assets
//! - [`PeriodicTask`] - Fixed-interval thread with cooperative cancellation
//! - [`ValueGenerator`] / [`SimulatedValueGenerator`] - Fresh values per type
//! - [`SignalUpdateService`] - Periodic sweeps writing generated values
//!
//! # Example
//!
//! ```ignore
//! use asset_signal_server::backend::{
//!     AssetRegistry, ConfigSignalProvider, SignalUpdateService, SimulatedValueGenerator,
//! };
//! use asset_signal_server::config::AppConfig;
//!
//! let config = AppConfig::sample();
//! let registry = AssetRegistry::shared(Box::new(ConfigSignalProvider::from_config(&config)));
//! registry.load()?;
//!
//! let mut service = SignalUpdateService::start(
//!     registry.clone(),
//!     Box::new(SimulatedValueGenerator::with_seed(1)),
//!     &config.update,
//! )?;
//! // ...
//! service.stop()?;
//! ```

pub mod periodic;
pub mod provider;
pub mod registry;
pub mod simulation;
pub mod worker;

pub use periodic::{FirstRun, PeriodicTask};
pub use provider::{ConfigSignalProvider, SignalProvider};
pub use registry::{AssetRegistry, SharedRegistry};
pub use simulation::{SimulatedValueGenerator, ValueGenerator};
pub use worker::{SignalUpdateService, SignalUpdater, SweepReport, UpdateStats, UpdateStatsSnapshot};
