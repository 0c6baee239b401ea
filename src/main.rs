//! Asset Signal Server - Main Entry Point
//!
//! Loads the configuration, brings the server up and keeps it running until
//! Ctrl+C (or SIGTERM on Unix), then shuts everything down in order.

use anyhow::Context;
use asset_signal_server::{
    backend::ConfigSignalProvider,
    config::{AppConfig, LoggingConfig},
    server::{AssetServer, LocalEndpoint},
};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config_path = AppConfig::resolve_path(cli_path);

    // Config is read before logging so its filter and directory apply; a
    // failure is reported once logging is up.
    let (config, load_error) = match &config_path {
        Some(path) => match AppConfig::load(path) {
            Ok(config) => (config, None),
            Err(e) => (AppConfig::sample(), Some(e)),
        },
        None => (AppConfig::sample(), None),
    };

    let _log_guard = init_logging(&config.logging)?;

    tracing::info!("Starting Asset Signal Server");
    match (&config_path, load_error) {
        (Some(path), None) => tracing::info!("Loaded configuration from {:?}", path),
        (Some(path), Some(e)) => {
            tracing::warn!("Failed to load config {:?}, using built-in sample: {}", path, e)
        }
        (None, _) => tracing::info!("No configuration file found, using built-in sample"),
    }

    let provider = ConfigSignalProvider::from_config(&config);
    let endpoint = LocalEndpoint::new(config.server.clone());
    let mut server = AssetServer::new(config, Box::new(provider), Box::new(endpoint));

    server
        .initialize()
        .context("Failed to initialize asset signal server")?;

    shutdown_signal().await?;

    server.shutdown().context("Shutdown did not complete cleanly")?;
    Ok(())
}

/// Console logging, plus a daily rolling file when a directory is configured.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.filter))?;

    let (file_layer, guard) = match &logging.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)
                .with_context(|| format!("Failed to create log directory {:?}", directory))?;
            let appender = tracing_appender::rolling::daily(directory, &logging.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// Wait for Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

        tokio::select! {
            result = ctrl_c => {
                result.context("Failed to listen for Ctrl+C")?;
                tracing::info!("Received Ctrl+C, initiating graceful shutdown");
            }
            _ = terminate.recv() => {
                tracing::info!("Received SIGTERM, initiating graceful shutdown");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.context("Failed to listen for Ctrl+C")?;
        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
    }

    Ok(())
}
