//! Address-space bridge: registry in, exposed tree out
//!
//! The bridge materializes the registry into an [`AddressSpace`] once
//! ([`AddressSpaceBridge::build`]) and then keeps the exposed values current
//! by re-reading every backing signal on each sync tick
//! ([`AddressSpaceBridge::sync_tick`]), driven by a [`PeriodicTask`].
//!
//! # Locking
//!
//! The tree lives behind one `Mutex` shared with the exposure layer. Build and
//! every sync tick hold it for their whole duration, so a reader either sees
//! no tree, or a complete tree whose leaves all come from the same tick.
//! Build assembles the tree off to the side and swaps it in only on success,
//! so a failed build leaves the previous state untouched.

use super::node::{VariableState, WireDataType};
use super::tree::AddressSpace;
use crate::backend::periodic::{FirstRun, PeriodicTask};
use crate::backend::registry::SharedRegistry;
use crate::error::{AssetServerError, Result};
use crate::types::Asset;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Address space shared between the bridge and the exposure layer
pub type SharedAddressSpace = Arc<Mutex<AddressSpace>>;

/// Name of the sync thread
pub const SYNC_TASK_NAME: &str = "address-space-sync";

/// Node counts produced by a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Asset folders (root excluded)
    pub folders: usize,
    /// Signal variables
    pub variables: usize,
}

/// Outcome of one sync tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Variables refreshed from their backing signal
    pub updated: usize,
    /// Variables whose asset or signal is no longer in the registry
    pub skipped: usize,
}

/// Lock the shared tree, recovering from a poisoned lock.
///
/// Build swaps the tree in with a single assignment and a sync tick only
/// overwrites whole leaf fields, so the tree is consistent between statements.
pub fn lock_space(space: &SharedAddressSpace) -> MutexGuard<'_, AddressSpace> {
    space.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Builds and syncs the exposed tree from the registry
pub struct AddressSpaceBridge {
    registry: SharedRegistry,
    space: SharedAddressSpace,
    sync_task: Option<PeriodicTask>,
    shutdown_timeout: Duration,
}

impl AddressSpaceBridge {
    /// Create a bridge with an empty tree in `namespace_uri`
    pub fn new(registry: SharedRegistry, namespace_uri: impl Into<String>) -> Self {
        Self {
            registry,
            space: Arc::new(Mutex::new(AddressSpace::new(namespace_uri))),
            sync_task: None,
            shutdown_timeout: Duration::from_millis(crate::config::DEFAULT_SHUTDOWN_TIMEOUT_MS),
        }
    }

    /// Shared handle to the tree, for the exposure layer
    pub fn space(&self) -> SharedAddressSpace {
        Arc::clone(&self.space)
    }

    /// Create the root folder, one folder per asset and one variable per signal.
    ///
    /// Build-once: a second call fails with an address-space error and leaves
    /// the tree untouched.
    pub fn build(&self) -> Result<BuildReport> {
        let mut guard = lock_space(&self.space);
        if guard.is_built() {
            return Err(AssetServerError::AddressSpace(
                "address space is already built".to_string(),
            ));
        }

        let mut assets = self.registry.get_all();
        assets.sort_by(|a, b| a.name().cmp(b.name()));

        let (space, report) = build_space(guard.namespace_uri(), &assets)?;
        *guard = space;

        tracing::info!(
            folders = report.folders,
            variables = report.variables,
            namespace = %guard.namespace_uri(),
            "Address space built"
        );
        Ok(report)
    }

    /// Copy every backing signal's current state into its variable node
    pub fn sync_tick(&self) -> SyncReport {
        sync_space(&self.registry, &self.space)
    }

    /// Start the periodic sync task.
    ///
    /// The first tick runs one `interval` after the call.
    pub fn start_sync(&mut self, interval: Duration, shutdown_timeout: Duration) -> Result<()> {
        if self.sync_task.is_some() {
            return Err(AssetServerError::AddressSpace(
                "sync task is already running".to_string(),
            ));
        }

        let registry = Arc::clone(&self.registry);
        let space = Arc::clone(&self.space);
        let task = PeriodicTask::spawn(SYNC_TASK_NAME, interval, FirstRun::AfterInterval, move || {
            sync_space(&registry, &space);
        })?;

        tracing::info!(?interval, "Address space sync started");
        self.sync_task = Some(task);
        self.shutdown_timeout = shutdown_timeout;
        Ok(())
    }

    /// Ask the sync task to stop without waiting; [`stop_sync`](Self::stop_sync) joins it
    pub(crate) fn signal_stop_sync(&mut self) {
        if let Some(task) = self.sync_task.as_mut() {
            task.signal_stop();
        }
    }

    /// Stop the sync task, if running
    pub fn stop_sync(&mut self) -> Result<()> {
        let Some(mut task) = self.sync_task.take() else {
            return Ok(());
        };

        if let Err(e) = task.stop(self.shutdown_timeout) {
            // Keep the handle so a later stop (or Drop) can still join it
            self.sync_task = Some(task);
            return Err(e);
        }

        tracing::info!("Address space sync stopped");
        Ok(())
    }

    pub fn is_syncing(&self) -> bool {
        self.sync_task.as_ref().is_some_and(|t| t.is_running())
    }
}

impl Drop for AddressSpaceBridge {
    fn drop(&mut self) {
        if let Err(e) = self.stop_sync() {
            tracing::warn!("Address space sync did not stop cleanly: {}", e);
        }
    }
}

impl std::fmt::Debug for AddressSpaceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressSpaceBridge")
            .field("registry", &self.registry)
            .field("syncing", &self.is_syncing())
            .finish_non_exhaustive()
    }
}

fn build_space(namespace_uri: &str, assets: &[Arc<Asset>]) -> Result<(AddressSpace, BuildReport)> {
    let mut space = AddressSpace::new(namespace_uri);
    let mut report = BuildReport::default();
    let now = Utc::now();

    let root = space.add_root()?;
    for asset in assets {
        let folder = space.add_folder(root, asset.name(), asset.name())?;
        report.folders += 1;

        for signal in asset.signals() {
            let state = VariableState::new(
                asset.name(),
                signal.name(),
                WireDataType::from(signal.data_type()),
                signal.sample(),
                now,
            );
            space.add_variable(folder, state)?;
            report.variables += 1;

            tracing::debug!(
                asset = %asset.name(),
                signal = %signal.name(),
                wire_type = %WireDataType::from(signal.data_type()),
                "Variable node created"
            );
        }
    }

    Ok((space, report))
}

fn sync_space(registry: &SharedRegistry, space: &SharedAddressSpace) -> SyncReport {
    let mut guard = lock_space(space);
    let mut report = SyncReport::default();
    if !guard.is_built() {
        return report;
    }

    let now = Utc::now();
    let mut assets: HashMap<String, Option<Arc<Asset>>> = HashMap::new();

    for state in guard.variables_mut() {
        let asset = assets
            .entry(state.asset_name.clone())
            .or_insert_with(|| registry.get(&state.asset_name));

        let sample = asset
            .as_ref()
            .and_then(|a| a.get_signal(&state.signal_name))
            .map(|signal| signal.sample());

        match sample {
            Some(sample) => {
                state.apply(sample, now);
                report.updated += 1;
            }
            None => report.skipped += 1,
        }
    }

    tracing::debug!(
        updated = report.updated,
        skipped = report.skipped,
        "Address space sync tick"
    );
    report
}
