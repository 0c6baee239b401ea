//! Value update scheduler
//!
//! This module contains the background process that keeps signal values
//! moving. Every sweep walks all assets in the registry and replaces each
//! signal's value with a fresh one of the same declared type, taken from a
//! [`ValueGenerator`].
//!
//! # Responsibilities
//!
//! - **Sweeping**: [`SignalUpdater::sweep`] performs one pass over the registry
//! - **Scheduling**: [`SignalUpdateService`] runs sweeps on a [`PeriodicTask`],
//!   first sweep immediately, then at the configured interval
//! - **Statistics tracking**: cumulative [`UpdateStats`] readable while running
//! - **Error handling**: a rejected value only affects that one signal; a
//!   panicking sweep is logged and the next sweep still runs
//!
//! # Cancellation
//!
//! [`SignalUpdateService::stop`] lets the in-flight sweep finish and returns
//! once the worker thread has exited; no signal is mutated after that.

use crate::backend::periodic::{FirstRun, PeriodicTask};
use crate::backend::registry::SharedRegistry;
use crate::backend::simulation::ValueGenerator;
use crate::config::UpdateConfig;
use crate::error::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Name of the scheduler thread
pub const UPDATE_TASK_NAME: &str = "signal-update";

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Signals that accepted a new value
    pub updated: usize,
    /// Signals whose update was rejected
    pub failed: usize,
}

/// Cumulative counters shared between the worker thread and its owner
#[derive(Debug, Default)]
pub struct UpdateStats {
    sweeps: AtomicU64,
    updated: AtomicU64,
    failed: AtomicU64,
}

/// Plain copy of [`UpdateStats`] at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStatsSnapshot {
    /// Completed sweeps
    pub sweeps: u64,
    /// Accepted value replacements
    pub updated: u64,
    /// Rejected value replacements
    pub failed: u64,
}

impl UpdateStats {
    /// Fold one sweep into the counters
    pub fn record(&self, report: SweepReport) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.updated
            .fetch_add(report.updated as u64, Ordering::Relaxed);
        self.failed.fetch_add(report.failed as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> UpdateStatsSnapshot {
        UpdateStatsSnapshot {
            sweeps: self.sweeps.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl UpdateStatsSnapshot {
    /// Calculate the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.updated + self.failed;
        if total == 0 {
            100.0
        } else {
            (self.updated as f64 / total as f64) * 100.0
        }
    }
}

/// Replaces every signal value in the registry with a generated one
pub struct SignalUpdater {
    registry: SharedRegistry,
    generator: Box<dyn ValueGenerator>,
}

impl SignalUpdater {
    pub fn new(registry: SharedRegistry, generator: Box<dyn ValueGenerator>) -> Self {
        Self {
            registry,
            generator,
        }
    }

    /// Run one pass over all assets and signals
    pub fn sweep(&mut self) -> SweepReport {
        let started = Instant::now();
        let mut report = SweepReport::default();

        for asset in self.registry.get_all() {
            for signal in asset.signals() {
                let current = signal.value();
                let next = self.generator.next_value(signal.data_type(), &current);

                match signal.update_value(next) {
                    Ok(()) => report.updated += 1,
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(
                            asset = %asset.name(),
                            signal = %signal.name(),
                            error = %e,
                            "Rejected simulated value"
                        );
                    }
                }
            }
        }

        tracing::debug!(
            updated = report.updated,
            failed = report.failed,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Simulation sweep complete"
        );
        report
    }
}

impl std::fmt::Debug for SignalUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalUpdater")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Periodic driver of [`SignalUpdater`] sweeps
#[derive(Debug)]
pub struct SignalUpdateService {
    task: PeriodicTask,
    stats: Arc<UpdateStats>,
    shutdown_timeout: Duration,
}

impl SignalUpdateService {
    /// Start sweeping: once immediately, then every `update.sweep_interval_ms`
    pub fn start(
        registry: SharedRegistry,
        generator: Box<dyn ValueGenerator>,
        config: &UpdateConfig,
    ) -> Result<Self> {
        let stats = Arc::new(UpdateStats::default());
        let worker_stats = Arc::clone(&stats);
        let mut updater = SignalUpdater::new(registry, generator);

        let task = PeriodicTask::spawn(
            UPDATE_TASK_NAME,
            config.sweep_interval(),
            FirstRun::Immediately,
            move || {
                let report = updater.sweep();
                worker_stats.record(report);
            },
        )?;

        tracing::info!(interval = ?config.sweep_interval(), "Signal update service started");

        Ok(Self {
            task,
            stats,
            shutdown_timeout: config.shutdown_timeout(),
        })
    }

    /// Cumulative counters since start
    pub fn stats(&self) -> UpdateStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Ask the sweep task to stop without waiting; [`stop`](Self::stop) joins it
    pub(crate) fn signal_stop(&mut self) {
        self.task.signal_stop();
    }

    /// Stop sweeping, waiting at most the configured shutdown timeout
    pub fn stop(&mut self) -> Result<()> {
        let was_running = self.task.is_running();
        self.task.stop(self.shutdown_timeout)?;
        if was_running {
            tracing::info!(sweeps = self.stats.snapshot().sweeps, "Signal update service stopped");
        }
        Ok(())
    }
}

impl Drop for SignalUpdateService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("Signal update service did not stop cleanly: {}", e);
        }
    }
}
