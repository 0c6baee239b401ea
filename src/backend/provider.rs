//! Signal providers: where the initial assets come from
//!
//! The registry only consumes a [`SignalProvider`]; it never knows how the
//! assets were described. [`ConfigSignalProvider`] reads the `assets` section
//! of the application config, infers each signal's type from its raw value
//! and builds the [`Asset`]s.
//!
//! Per-signal problems never fail the asset: a missing value, a value that
//! fails validation or a duplicate name is logged and that one signal is left
//! out.

use crate::config::{AppConfig, AssetDefinitions};
use crate::error::{AssetServerError, Result};
use crate::types::{Asset, Signal, SignalValue};

/// Source of the initial asset set
#[cfg_attr(test, mockall::automock)]
pub trait SignalProvider: Send + Sync {
    /// Names of all assets this provider knows about
    fn asset_names(&self) -> Result<Vec<String>>;

    /// Build a single asset, or `None` if the provider has no data for it
    fn get_asset(&self, name: &str) -> Result<Option<Asset>>;

    /// Build every asset.
    ///
    /// Assets that fail or have no data are logged and skipped; only a failure
    /// to list the assets fails the whole call.
    fn get_all_assets(&self) -> Result<Vec<Asset>> {
        let names = self.asset_names()?;
        let mut assets = Vec::with_capacity(names.len());

        for name in names {
            match self.get_asset(&name) {
                Ok(Some(asset)) => assets.push(asset),
                Ok(None) => {
                    tracing::warn!(asset = %name, "Provider returned no data for asset, skipping");
                }
                Err(e) => {
                    tracing::warn!(asset = %name, error = %e, "Failed to load asset, skipping");
                }
            }
        }

        tracing::info!(asset_count = assets.len(), "Loaded asset definitions");
        Ok(assets)
    }
}

/// Provider backed by the `assets` section of [`AppConfig`]
#[derive(Debug, Clone, Default)]
pub struct ConfigSignalProvider {
    assets: AssetDefinitions,
}

impl ConfigSignalProvider {
    /// Create a provider over a set of asset definitions
    pub fn new(assets: AssetDefinitions) -> Self {
        Self { assets }
    }

    /// Create a provider from the application config
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.assets.clone())
    }
}

impl SignalProvider for ConfigSignalProvider {
    fn asset_names(&self) -> Result<Vec<String>> {
        if self.assets.is_empty() {
            tracing::warn!("No assets section found in configuration");
        }
        Ok(self.assets.keys().cloned().collect())
    }

    fn get_asset(&self, name: &str) -> Result<Option<Asset>> {
        let Some(definitions) = self.assets.get(name) else {
            tracing::warn!(asset = %name, "Asset configuration not found");
            return Ok(None);
        };

        let mut asset = Asset::new(name)
            .map_err(|e| AssetServerError::Provider(format!("invalid asset '{}': {}", name, e)))?;

        for (signal_name, raw) in definitions {
            let raw = match raw.as_ref().map(|v| v.to_raw_string()) {
                Some(raw) if !raw.is_empty() => raw,
                _ => {
                    tracing::warn!(
                        asset = %name,
                        signal = %signal_name,
                        "Skipping signal with empty value"
                    );
                    continue;
                }
            };

            let value = SignalValue::parse(&raw);
            let data_type = value.data_type();
            let signal = match Signal::new(signal_name.as_str(), value, data_type) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::warn!(asset = %name, signal = %signal_name, error = %e, "Skipping invalid signal");
                    continue;
                }
            };

            let initial = signal.value();
            if let Err(e) = asset.add_signal(signal) {
                tracing::warn!(asset = %name, signal = %signal_name, error = %e, "Skipping signal");
                continue;
            }

            tracing::debug!(
                asset = %name,
                signal = %signal_name,
                value = %initial,
                data_type = %data_type,
                "Loaded signal"
            );
        }

        Ok(Some(asset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigValue;
    use crate::types::SignalDataType;
    use std::collections::BTreeMap;

    fn definitions() -> AssetDefinitions {
        let mut assets = AssetDefinitions::new();
        let mut mixer = BTreeMap::new();
        mixer.insert("Batch".to_string(), Some(ConfigValue::Text("123".to_string())));
        mixer.insert("Level".to_string(), Some(ConfigValue::Text("123.5".to_string())));
        mixer.insert("Open".to_string(), Some(ConfigValue::Text("true".to_string())));
        mixer.insert("Recipe".to_string(), Some(ConfigValue::Text("hello".to_string())));
        mixer.insert("Unset".to_string(), None);
        mixer.insert("Blank".to_string(), Some(ConfigValue::Text(String::new())));
        mixer.insert("  ".to_string(), Some(ConfigValue::Text("7".to_string())));
        assets.insert("Mixer_01".to_string(), mixer);
        assets
    }

    #[test]
    fn test_config_provider_infers_types() {
        let provider = ConfigSignalProvider::new(definitions());
        let asset = provider.get_asset("Mixer_01").unwrap().unwrap();

        let type_of = |name: &str| asset.get_signal(name).unwrap().data_type();
        assert_eq!(type_of("Batch"), SignalDataType::Integer);
        assert_eq!(type_of("Level"), SignalDataType::Double);
        assert_eq!(type_of("Open"), SignalDataType::Boolean);
        assert_eq!(type_of("Recipe"), SignalDataType::String);
    }

    #[test]
    fn test_config_provider_skips_empty_values() {
        let provider = ConfigSignalProvider::new(definitions());
        let asset = provider.get_asset("Mixer_01").unwrap().unwrap();

        assert_eq!(asset.signal_count(), 4);
        assert!(asset.get_signal("Unset").is_none());
        assert!(asset.get_signal("Blank").is_none());
    }

    #[test]
    fn test_config_provider_drops_unnamed_signal_keeps_asset() {
        let provider = ConfigSignalProvider::new(definitions());
        let asset = provider.get_asset("Mixer_01").unwrap().unwrap();

        assert_eq!(asset.name(), "Mixer_01");
        assert!(asset.get_signal("  ").is_none());
        assert!(asset.signals().iter().all(|s| !s.name().trim().is_empty()));
        assert_eq!(asset.signal_count(), 4);
    }

    #[test]
    fn test_unknown_asset_is_none() {
        let provider = ConfigSignalProvider::new(definitions());
        assert!(provider.get_asset("Nope").unwrap().is_none());
    }

    #[test]
    fn test_get_all_assets_from_sample() {
        let provider = ConfigSignalProvider::from_config(&AppConfig::sample());
        let assets = provider.get_all_assets().unwrap();
        assert_eq!(assets.len(), 3);
    }

    /// Exercises the default `get_all_assets` against a provider whose
    /// per-asset lookups fail or come back empty.
    struct PartialProvider;

    impl SignalProvider for PartialProvider {
        fn asset_names(&self) -> Result<Vec<String>> {
            Ok(vec!["Good".into(), "Missing".into(), "Broken".into()])
        }

        fn get_asset(&self, name: &str) -> Result<Option<Asset>> {
            match name {
                "Good" => Ok(Some(Asset::new("Good")?)),
                "Missing" => Ok(None),
                _ => Err(AssetServerError::Provider("backend offline".into())),
            }
        }
    }

    #[test]
    fn test_get_all_assets_skips_failed_assets() {
        let assets = PartialProvider.get_all_assets().unwrap();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].name(), "Good");
    }
}
