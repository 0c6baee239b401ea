//! Core data types for the asset signal server
//!
//! This module contains the value objects the rest of the crate is built on:
//! signals (named, typed measurements) and the assets that own them.
//!
//! # Main Types
//!
//! - [`SignalDataType`] - The four supported declared types
//! - [`SignalValue`] - A value tagged with its runtime type
//! - [`Signal`] - A named measurement whose value is type-checked on every write
//! - [`Asset`] - A named device owning an ordered set of uniquely named signals
//!
//! # Type Invariant
//!
//! A [`Signal`] never holds a value whose variant differs from its declared
//! type. Construction and [`Signal::update_value`] both check the variant and
//! the check and commit happen under the same write guard, so a rejected write
//! leaves the previous value in place.
//!
//! # Value Inference
//!
//! Configured values arrive as strings. [`SignalValue::parse`] infers the type
//! by trying floating-point, integer, boolean and finally text. The
//! floating-point attempt does not claim strings that are valid 32-bit
//! integers, so `"123"` is an integer while `"123.5"` is a double.

use crate::error::{AssetServerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Declared type of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalDataType {
    /// 64-bit floating point
    Double,
    /// Text
    String,
    /// 32-bit signed integer
    Integer,
    /// Boolean value
    Boolean,
}

impl SignalDataType {
    /// All supported declared types
    pub fn all() -> &'static [SignalDataType] {
        &[
            SignalDataType::Double,
            SignalDataType::String,
            SignalDataType::Integer,
            SignalDataType::Boolean,
        ]
    }
}

impl std::fmt::Display for SignalDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalDataType::Double => write!(f, "Double"),
            SignalDataType::String => write!(f, "String"),
            SignalDataType::Integer => write!(f, "Integer"),
            SignalDataType::Boolean => write!(f, "Boolean"),
        }
    }
}

/// A signal value tagged with its runtime type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SignalValue {
    Double(f64),
    Integer(i32),
    Boolean(bool),
    String(String),
}

impl SignalValue {
    /// The declared type this variant satisfies
    pub fn data_type(&self) -> SignalDataType {
        match self {
            SignalValue::Double(_) => SignalDataType::Double,
            SignalValue::Integer(_) => SignalDataType::Integer,
            SignalValue::Boolean(_) => SignalDataType::Boolean,
            SignalValue::String(_) => SignalDataType::String,
        }
    }

    /// Check whether this value may be stored in a signal of `data_type`
    pub fn matches(&self, data_type: SignalDataType) -> bool {
        self.data_type() == data_type
    }

    /// Infer a typed value from a raw configured string.
    ///
    /// Attempt order is float, integer, boolean, text. Only finite numbers
    /// count as floats, so `"inf"` or `"NaN"` stay text.
    pub fn parse(raw: &str) -> SignalValue {
        let trimmed = raw.trim();

        if trimmed.parse::<i32>().is_err() {
            if let Ok(value) = trimmed.parse::<f64>() {
                if value.is_finite() {
                    return SignalValue::Double(value);
                }
            }
        }

        if let Ok(value) = trimmed.parse::<i32>() {
            return SignalValue::Integer(value);
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return SignalValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return SignalValue::Boolean(false);
        }

        SignalValue::String(raw.to_string())
    }
}

impl std::fmt::Display for SignalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalValue::Double(v) => write!(f, "{}", v),
            SignalValue::Integer(v) => write!(f, "{}", v),
            SignalValue::Boolean(v) => write!(f, "{}", v),
            SignalValue::String(v) => write!(f, "{}", v),
        }
    }
}

/// Quality marker attached to a signal's current value.
///
/// Only typed, accepted values are ever stored, so every stored value is good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Quality {
    #[default]
    Good,
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Good => write!(f, "Good"),
        }
    }
}

/// Point-in-time copy of a signal's mutable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSample {
    /// Current value
    pub value: SignalValue,
    /// When the value was last accepted
    pub timestamp: DateTime<Utc>,
    /// Quality of the value
    pub quality: Quality,
}

/// A named, typed measurement belonging to an asset
#[derive(Debug)]
pub struct Signal {
    name: String,
    data_type: SignalDataType,
    state: RwLock<SignalSample>,
}

impl Signal {
    /// Create a new signal, rejecting empty names and mismatched values
    pub fn new(
        name: impl Into<String>,
        value: SignalValue,
        data_type: SignalDataType,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AssetServerError::InvalidName(
                "signal name cannot be empty".to_string(),
            ));
        }

        if !value.matches(data_type) {
            return Err(AssetServerError::Validation {
                signal: name,
                expected: data_type,
                actual: value.data_type(),
            });
        }

        Ok(Self {
            name,
            data_type,
            state: RwLock::new(SignalSample {
                value,
                timestamp: Utc::now(),
                quality: Quality::Good,
            }),
        })
    }

    /// Create a signal whose declared type is taken from the value itself
    pub fn with_value(name: impl Into<String>, value: SignalValue) -> Result<Self> {
        let data_type = value.data_type();
        Self::new(name, value, data_type)
    }

    /// Signal name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn data_type(&self) -> SignalDataType {
        self.data_type
    }

    /// Current value
    pub fn value(&self) -> SignalValue {
        self.read_state().value.clone()
    }

    /// Current value, timestamp and quality, read together
    pub fn sample(&self) -> SignalSample {
        self.read_state().clone()
    }

    /// Replace the value after checking it against the declared type.
    ///
    /// On a mismatch the previous value, timestamp and quality are kept.
    pub fn update_value(&self, value: SignalValue) -> Result<()> {
        let mut state = self.write_state();

        if !value.matches(self.data_type) {
            return Err(AssetServerError::Validation {
                signal: self.name.clone(),
                expected: self.data_type,
                actual: value.data_type(),
            });
        }

        state.value = value;
        state.timestamp = Utc::now();
        state.quality = Quality::Good;
        Ok(())
    }

    // A poisoned guard still holds a valid sample: writes are single assignments
    // made after the type check.
    fn read_state(&self) -> RwLockReadGuard<'_, SignalSample> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SignalSample> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A named industrial device owning its signals
#[derive(Debug)]
pub struct Asset {
    name: String,
    signals: Vec<Signal>,
}

impl Asset {
    /// Create an empty asset
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AssetServerError::InvalidName(
                "asset name cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            name,
            signals: Vec::new(),
        })
    }

    /// Asset name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a signal. Fails if a signal with the same name already exists.
    pub fn add_signal(&mut self, signal: Signal) -> Result<()> {
        if self.get_signal(signal.name()).is_some() {
            return Err(AssetServerError::DuplicateName {
                asset: self.name.clone(),
                signal: signal.name().to_string(),
            });
        }

        self.signals.push(signal);
        Ok(())
    }

    /// Signals in discovery order
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Look up a signal by name
    pub fn get_signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_inference_order() {
        assert_eq!(SignalValue::parse("123"), SignalValue::Integer(123));
        assert_eq!(SignalValue::parse("123.5"), SignalValue::Double(123.5));
        assert_eq!(SignalValue::parse("true"), SignalValue::Boolean(true));
        assert_eq!(SignalValue::parse("False"), SignalValue::Boolean(false));
        assert_eq!(
            SignalValue::parse("hello"),
            SignalValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_parse_out_of_range_integer_is_double() {
        assert_eq!(
            SignalValue::parse("99999999999"),
            SignalValue::Double(99_999_999_999.0)
        );
    }

    #[test]
    fn test_parse_keeps_original_text() {
        assert_eq!(
            SignalValue::parse(" Running "),
            SignalValue::String(" Running ".to_string())
        );
    }

    #[test]
    fn test_parse_non_finite_is_text() {
        for raw in ["inf", "-Infinity", "NaN", "nan", "1e400"] {
            assert_eq!(SignalValue::parse(raw), SignalValue::String(raw.to_string()));
        }
    }

    #[test]
    fn test_signal_rejects_mismatched_initial_value() {
        let err = Signal::new("Speed", SignalValue::Boolean(true), SignalDataType::Double)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_signal_rejects_empty_name() {
        let err = Signal::with_value("  ", SignalValue::Integer(1)).unwrap_err();
        assert!(matches!(err, AssetServerError::InvalidName(_)));
    }

    #[test]
    fn test_update_value_keeps_previous_on_mismatch() {
        let signal = Signal::with_value("Temperature", SignalValue::Double(72.5)).unwrap();
        let before = signal.sample();

        let err = signal
            .update_value(SignalValue::String("hot".into()))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(signal.sample(), before);

        signal.update_value(SignalValue::Double(80.0)).unwrap();
        assert_eq!(signal.value(), SignalValue::Double(80.0));
        assert_eq!(signal.data_type(), SignalDataType::Double);
    }

    #[test]
    fn test_asset_duplicate_signal_keeps_first() {
        let mut asset = Asset::new("RoboticWelder_01").unwrap();
        asset
            .add_signal(Signal::with_value("Current", SignalValue::Double(150.0)).unwrap())
            .unwrap();

        let err = asset
            .add_signal(Signal::with_value("Current", SignalValue::Integer(7)).unwrap())
            .unwrap_err();

        assert!(matches!(err, AssetServerError::DuplicateName { .. }));
        assert_eq!(asset.signal_count(), 1);
        assert_eq!(
            asset.get_signal("Current").unwrap().value(),
            SignalValue::Double(150.0)
        );
    }

    #[test]
    fn test_asset_preserves_discovery_order() {
        let mut asset = Asset::new("Conveyor_01").unwrap();
        for name in ["Speed", "Load", "Running"] {
            asset
                .add_signal(Signal::with_value(name, SignalValue::Integer(0)).unwrap())
                .unwrap();
        }
        let names: Vec<_> = asset.signals().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Speed", "Load", "Running"]);
    }

    #[test]
    fn test_asset_rejects_empty_name() {
        assert!(Asset::new("").is_err());
    }

    proptest! {
        #[test]
        fn prop_i32_strings_infer_integer(n in any::<i32>()) {
            prop_assert_eq!(SignalValue::parse(&n.to_string()), SignalValue::Integer(n));
        }

        #[test]
        fn prop_fractional_strings_infer_double(v in -1.0e6f64..1.0e6f64) {
            prop_assume!(v.fract() != 0.0);
            let parsed = SignalValue::parse(&format!("{:?}", v));
            prop_assert_eq!(parsed, SignalValue::Double(v));
        }

        #[test]
        fn prop_update_never_breaks_type_invariant(
            declared in prop::sample::select(SignalDataType::all().to_vec()),
            raw in "[a-z0-9.]{1,8}",
        ) {
            let initial = match declared {
                SignalDataType::Double => SignalValue::Double(0.5),
                SignalDataType::Integer => SignalValue::Integer(0),
                SignalDataType::Boolean => SignalValue::Boolean(false),
                SignalDataType::String => SignalValue::String(String::new()),
            };
            let signal = Signal::new("s", initial, declared).unwrap();
            let candidate = SignalValue::parse(&raw);
            let accepted = signal.update_value(candidate.clone()).is_ok();

            prop_assert_eq!(accepted, candidate.data_type() == declared);
            prop_assert_eq!(signal.value().data_type(), declared);
        }
    }
}
