//! Asset registry: the single source of truth for assets and signals
//!
//! The registry is created once, loaded once at startup and then shared by
//! `Arc` with the address-space bridge (reader) and the update service
//! (writer of signal values). Assets are stored as `Arc<Asset>`, so every
//! lookup of a name after a load hands out the same instance; signal values
//! are mutated in place through [`Signal::update_value`](crate::types::Signal::update_value).
//!
//! Lifecycle: single writer during [`AssetRegistry::load`], many readers after.

use crate::backend::provider::SignalProvider;
use crate::error::{AssetServerError, Result};
use crate::types::Asset;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Registry shared between the bridge and the update service
pub type SharedRegistry = Arc<AssetRegistry>;

/// Name-keyed cache of assets loaded from a [`SignalProvider`]
pub struct AssetRegistry {
    provider: Box<dyn SignalProvider>,
    cache: RwLock<HashMap<String, Arc<Asset>>>,
    loaded: AtomicBool,
}

impl AssetRegistry {
    /// Create an empty registry over a provider
    pub fn new(provider: Box<dyn SignalProvider>) -> Self {
        Self {
            provider,
            cache: RwLock::new(HashMap::new()),
            loaded: AtomicBool::new(false),
        }
    }

    /// Create an empty registry ready to be shared
    pub fn shared(provider: Box<dyn SignalProvider>) -> SharedRegistry {
        Arc::new(Self::new(provider))
    }

    /// Fetch all assets from the provider and cache them by name.
    ///
    /// Within one load a repeated name overwrites the earlier asset. The cache
    /// is replaced by the result of this load. Intended to be called once at
    /// startup.
    pub fn load(&self) -> Result<Vec<Arc<Asset>>> {
        tracing::info!("Loading assets from signal provider...");

        let assets = self.provider.get_all_assets().map_err(|e| match e {
            AssetServerError::Provider(_) => e,
            other => AssetServerError::Provider(other.to_string()),
        })?;

        let mut cache = HashMap::with_capacity(assets.len());
        let mut loaded = Vec::with_capacity(assets.len());

        for asset in assets {
            let asset = Arc::new(asset);

            tracing::info!(
                asset = %asset.name(),
                signal_count = asset.signal_count(),
                "Asset loaded"
            );
            for signal in asset.signals() {
                tracing::debug!(
                    asset = %asset.name(),
                    signal = %signal.name(),
                    value = %signal.value(),
                    data_type = %signal.data_type(),
                    "Signal created"
                );
            }

            if cache
                .insert(asset.name().to_string(), Arc::clone(&asset))
                .is_some()
            {
                tracing::warn!(asset = %asset.name(), "Duplicate asset name, later definition wins");
            }
            loaded.push(asset);
        }

        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = cache;
        self.loaded.store(true, Ordering::Release);

        tracing::info!(
            asset_count = self.len(),
            signal_count = self.signal_count(),
            "Asset registry loaded"
        );
        Ok(loaded)
    }

    /// Look up an asset by name
    pub fn get(&self, name: &str) -> Option<Arc<Asset>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Snapshot of all cached assets, in no particular order
    pub fn get_all(&self) -> Vec<Arc<Asset>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Number of cached assets
    pub fn len(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once a load has completed successfully
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Total number of signals across all cached assets
    pub fn signal_count(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|a| a.signal_count())
            .sum()
    }
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("assets", &self.len())
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}
