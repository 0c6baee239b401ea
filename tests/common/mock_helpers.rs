//! Mock construction helpers

use asset_signal_server::backend::{SignalProvider, ValueGenerator};
use asset_signal_server::{Asset, AssetServerError, Result, SignalDataType, SignalValue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builds a fresh asset set on every call
pub type AssetFactory = Box<dyn Fn() -> Vec<Asset> + Send + Sync>;

/// Provider that rebuilds the same assets on every call
pub struct StaticProvider {
    factory: AssetFactory,
}

impl StaticProvider {
    pub fn new(factory: impl Fn() -> Vec<Asset> + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }
}

impl SignalProvider for StaticProvider {
    fn asset_names(&self) -> Result<Vec<String>> {
        Ok((self.factory)().iter().map(|a| a.name().to_string()).collect())
    }

    fn get_asset(&self, name: &str) -> Result<Option<Asset>> {
        Ok((self.factory)().into_iter().find(|a| a.name() == name))
    }

    fn get_all_assets(&self) -> Result<Vec<Asset>> {
        Ok((self.factory)())
    }
}

/// Provider returning a different asset set on each load
pub struct SequenceProvider {
    loads: Vec<AssetFactory>,
    calls: AtomicUsize,
}

impl SequenceProvider {
    pub fn new(loads: Vec<AssetFactory>) -> Self {
        Self {
            loads,
            calls: AtomicUsize::new(0),
        }
    }
}

impl SignalProvider for SequenceProvider {
    fn asset_names(&self) -> Result<Vec<String>> {
        Ok(self.get_all_assets()?.iter().map(|a| a.name().to_string()).collect())
    }

    fn get_asset(&self, _name: &str) -> Result<Option<Asset>> {
        Ok(None)
    }

    fn get_all_assets(&self) -> Result<Vec<Asset>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let load = self
            .loads
            .get(call.min(self.loads.len().saturating_sub(1)))
            .ok_or_else(|| AssetServerError::Provider("no loads configured".into()))?;
        Ok(load())
    }
}

/// Provider that always fails
pub struct FailingProvider;

impl SignalProvider for FailingProvider {
    fn asset_names(&self) -> Result<Vec<String>> {
        Err(AssetServerError::Provider("configuration store unavailable".into()))
    }

    fn get_asset(&self, _name: &str) -> Result<Option<Asset>> {
        Err(AssetServerError::Provider("configuration store unavailable".into()))
    }
}

/// Generator that returns a fixed value per type and counts its calls
#[derive(Clone, Default)]
pub struct CountingGenerator {
    pub calls: Arc<AtomicUsize>,
}

impl ValueGenerator for CountingGenerator {
    fn next_value(&mut self, data_type: SignalDataType, _current: &SignalValue) -> SignalValue {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match data_type {
            SignalDataType::Double => SignalValue::Double(75.0),
            SignalDataType::Integer => SignalValue::Integer(7),
            SignalDataType::Boolean => SignalValue::Boolean(true),
            SignalDataType::String => SignalValue::String("Status_000000".into()),
        }
    }
}
