//! Server host: startup and shutdown orchestration
//!
//! [`AssetServer`] wires the components together in dependency order:
//!
//! 1. Load the registry from the signal provider
//! 2. Build the address space
//! 3. Start the exposure layer
//! 4. Start the address-space sync task
//! 5. Start the simulation sweeps (when enabled)
//!
//! Any failure tears down what already started and is reported as a
//! [`AssetServerError::Startup`]. Shutdown runs the reverse: periodic tasks
//! first, then the exposure layer.

use crate::address_space::{AddressSpaceBridge, SharedAddressSpace};
use crate::backend::provider::SignalProvider;
use crate::backend::registry::{AssetRegistry, SharedRegistry};
use crate::backend::simulation::{SimulatedValueGenerator, ValueGenerator};
use crate::backend::worker::{SignalUpdateService, UpdateStatsSnapshot};
use crate::config::AppConfig;
use crate::error::{AssetServerError, Result, ResultExt};
use crate::server::endpoint::ExposureServer;

/// Lifecycle state of an [`AssetServer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Constructed, not initialized
    Created,
    /// All components running
    Ready,
    /// Shut down
    Stopped,
    /// Initialization failed; everything started has been torn down
    Failed,
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerState::Created => write!(f, "Created"),
            ServerState::Ready => write!(f, "Ready"),
            ServerState::Stopped => write!(f, "Stopped"),
            ServerState::Failed => write!(f, "Failed"),
        }
    }
}

/// Hosts the registry, the bridge, the update service and the exposure layer
pub struct AssetServer {
    config: AppConfig,
    registry: SharedRegistry,
    bridge: AddressSpaceBridge,
    endpoint: Box<dyn ExposureServer>,
    generator: Option<Box<dyn ValueGenerator>>,
    updater: Option<SignalUpdateService>,
    state: ServerState,
}

impl AssetServer {
    pub fn new(
        config: AppConfig,
        provider: Box<dyn SignalProvider>,
        endpoint: Box<dyn ExposureServer>,
    ) -> Self {
        let registry = AssetRegistry::shared(provider);
        let bridge = AddressSpaceBridge::new(
            std::sync::Arc::clone(&registry),
            config.server.namespace_uri.clone(),
        );

        Self {
            config,
            registry,
            bridge,
            endpoint,
            generator: None,
            updater: None,
            state: ServerState::Created,
        }
    }

    /// Use `generator` for the simulation sweeps instead of the configured one
    pub fn with_generator(mut self, generator: Box<dyn ValueGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Bring every component up. The server is ready only when all succeed.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state != ServerState::Created {
            return Err(AssetServerError::Startup(format!(
                "cannot initialize a server in state {}",
                self.state
            )));
        }

        tracing::info!(
            application = %self.config.server.application_name,
            "Initializing asset signal server"
        );

        match self.start_components() {
            Ok(()) => {
                self.state = ServerState::Ready;
                self.log_banner();
                Ok(())
            }
            Err(e) => {
                tracing::error!("Server initialization failed: {}", e);
                self.teardown();
                self.state = ServerState::Failed;
                Err(match e {
                    AssetServerError::Startup(_) => e,
                    other => AssetServerError::Startup(other.to_string()),
                })
            }
        }
    }

    /// Stop the periodic tasks, then the exposure layer. Idempotent.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state != ServerState::Ready {
            return Ok(());
        }

        tracing::info!("Shutting down asset signal server...");
        let result = self.stop_components();
        self.state = ServerState::Stopped;

        match &result {
            Ok(()) => tracing::info!("Asset signal server stopped"),
            Err(e) => tracing::error!("Asset signal server stopped with errors: {}", e),
        }
        result
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ServerState::Ready
    }

    pub fn registry(&self) -> SharedRegistry {
        std::sync::Arc::clone(&self.registry)
    }

    /// The exposed tree
    pub fn space(&self) -> SharedAddressSpace {
        self.bridge.space()
    }

    pub fn endpoint_url(&self) -> String {
        self.endpoint.endpoint_url()
    }

    /// Sweep counters, `None` when simulation is not running
    pub fn update_stats(&self) -> Option<UpdateStatsSnapshot> {
        self.updater.as_ref().map(|u| u.stats())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn start_components(&mut self) -> Result<()> {
        let assets = self.registry.load().context("Failed to load assets")?;
        if assets.is_empty() {
            tracing::warn!("No assets loaded; the address space will only contain the root folder");
        }

        self.bridge
            .build()
            .context("Failed to build address space")?;
        self.endpoint.start(self.bridge.space())?;

        let update = &self.config.update;
        self.bridge
            .start_sync(update.sync_interval(), update.shutdown_timeout())?;

        if self.config.simulation.enabled {
            let generator = self.generator.take().unwrap_or_else(|| {
                Box::new(SimulatedValueGenerator::from_seed_option(
                    self.config.simulation.seed,
                ))
            });
            self.updater = Some(SignalUpdateService::start(
                self.registry(),
                generator,
                update,
            )?);
        } else {
            tracing::info!("Simulation disabled, signal values stay at their configured values");
        }

        Ok(())
    }

    /// Stop everything, continuing past failures; returns the first error.
    ///
    /// Both periodic tasks are signalled before either is waited on, so their
    /// in-flight iterations finish in parallel.
    fn stop_components(&mut self) -> Result<()> {
        let mut first_error = None;

        if let Some(updater) = self.updater.as_mut() {
            updater.signal_stop();
        }
        self.bridge.signal_stop_sync();

        if let Some(mut updater) = self.updater.take() {
            if let Err(e) = updater.stop() {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.bridge.stop_sync() {
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.endpoint.stop() {
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn teardown(&mut self) {
        if let Err(e) = self.stop_components() {
            tracing::warn!("Error while tearing down partial startup: {}", e);
        }
    }

    fn log_banner(&self) {
        tracing::info!("==============================================");
        tracing::info!("Asset signal server is running");
        tracing::info!("Endpoint:  {}", self.endpoint.endpoint_url());
        tracing::info!("Namespace: {}", self.config.server.namespace_uri);
        tracing::info!("Assets:    {}", self.registry.len());
        tracing::info!("Signals:   {}", self.registry.signal_count());
        tracing::info!(
            "Cadence:   sync every {:?}, sweep every {:?}",
            self.config.update.sync_interval(),
            self.config.update.sweep_interval()
        );
        tracing::info!("==============================================");
    }
}

impl Drop for AssetServer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!("Shutdown on drop failed: {}", e);
        }
    }
}

impl std::fmt::Debug for AssetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetServer")
            .field("state", &self.state)
            .field("registry", &self.registry)
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::provider::{ConfigSignalProvider, MockSignalProvider};
    use crate::server::endpoint::MockExposureServer;
    use mockall::Sequence;

    fn fast_config() -> AppConfig {
        let mut config = AppConfig::sample();
        config.update.sync_interval_ms = 10;
        config.update.sweep_interval_ms = 10;
        config.simulation.seed = Some(5);
        config
    }

    fn running_endpoint() -> MockExposureServer {
        let mut endpoint = MockExposureServer::new();
        endpoint.expect_start().times(1).returning(|_| Ok(()));
        endpoint.expect_stop().returning(|| Ok(()));
        endpoint
            .expect_endpoint_url()
            .returning(|| "opc.tcp://localhost:4840".to_string());
        endpoint
    }

    #[test]
    fn test_initialize_and_shutdown() {
        let config = fast_config();
        let provider = ConfigSignalProvider::from_config(&config);
        let mut server = AssetServer::new(config, Box::new(provider), Box::new(running_endpoint()));

        server.initialize().unwrap();
        assert!(server.is_ready());
        assert_eq!(server.registry().len(), 3);
        assert!(server.update_stats().is_some());

        std::thread::sleep(std::time::Duration::from_millis(50));
        server.shutdown().unwrap();
        assert_eq!(server.state(), ServerState::Stopped);

        // Idempotent
        server.shutdown().unwrap();
    }

    #[test]
    fn test_endpoint_failure_is_startup_error() {
        let config = fast_config();
        let provider = ConfigSignalProvider::from_config(&config);

        let mut endpoint = MockExposureServer::new();
        endpoint
            .expect_start()
            .returning(|_| Err(AssetServerError::AddressSpace("port in use".into())));
        endpoint.expect_stop().returning(|| Ok(()));

        let mut server = AssetServer::new(config, Box::new(provider), Box::new(endpoint));
        let err = server.initialize().unwrap_err();

        assert!(matches!(err, AssetServerError::Startup(_)));
        assert_eq!(server.state(), ServerState::Failed);
        assert!(server.update_stats().is_none());
    }

    #[test]
    fn test_provider_failure_never_starts_endpoint() {
        let mut provider = MockSignalProvider::new();
        provider
            .expect_get_all_assets()
            .returning(|| Err(AssetServerError::Provider("offline".into())));

        let mut endpoint = MockExposureServer::new();
        endpoint.expect_start().never();
        endpoint.expect_stop().returning(|| Ok(()));

        let mut server = AssetServer::new(fast_config(), Box::new(provider), Box::new(endpoint));
        assert!(matches!(
            server.initialize(),
            Err(AssetServerError::Startup(_))
        ));
    }

    #[test]
    fn test_shutdown_stops_endpoint_last() {
        let config = fast_config();
        let provider = ConfigSignalProvider::from_config(&config);

        let mut seq = Sequence::new();
        let mut endpoint = MockExposureServer::new();
        endpoint
            .expect_start()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        endpoint
            .expect_stop()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        endpoint
            .expect_endpoint_url()
            .returning(|| "opc.tcp://localhost:4840".to_string());

        let mut server = AssetServer::new(config, Box::new(provider), Box::new(endpoint));
        server.initialize().unwrap();
        server.shutdown().unwrap();
        assert!(server.update_stats().is_none());
    }

    /// Stalls on its first value, then echoes the current value
    struct StallingGenerator {
        stalled: bool,
    }

    impl ValueGenerator for StallingGenerator {
        fn next_value(
            &mut self,
            _data_type: crate::types::SignalDataType,
            current: &crate::types::SignalValue,
        ) -> crate::types::SignalValue {
            if !self.stalled {
                self.stalled = true;
                std::thread::sleep(std::time::Duration::from_millis(300));
            }
            current.clone()
        }
    }

    #[test]
    fn test_shutdown_waits_for_in_flight_sweep() {
        let config = fast_config();
        let provider = ConfigSignalProvider::from_config(&config);
        let mut server = AssetServer::new(config, Box::new(provider), Box::new(running_endpoint()))
            .with_generator(Box::new(StallingGenerator { stalled: false }));

        server.initialize().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(30));

        let started = std::time::Instant::now();
        server.shutdown().unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= std::time::Duration::from_millis(200), "{:?}", elapsed);
        assert!(elapsed < server.config().update.shutdown_timeout());
        assert_eq!(server.state(), ServerState::Stopped);
    }

    #[test]
    fn test_second_initialize_rejected() {
        let config = fast_config();
        let provider = ConfigSignalProvider::from_config(&config);
        let mut server = AssetServer::new(config, Box::new(provider), Box::new(running_endpoint()));

        server.initialize().unwrap();
        assert!(matches!(
            server.initialize(),
            Err(AssetServerError::Startup(_))
        ));
        server.shutdown().unwrap();
    }

    #[test]
    fn test_simulation_disabled() {
        let mut config = fast_config();
        config.simulation.enabled = false;
        let provider = ConfigSignalProvider::from_config(&config);
        let mut server = AssetServer::new(config, Box::new(provider), Box::new(running_endpoint()));

        server.initialize().unwrap();
        assert!(server.update_stats().is_none());
        server.shutdown().unwrap();
    }
}
