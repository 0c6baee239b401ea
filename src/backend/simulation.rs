//! Simulated signal values
//!
//! This module provides the value source used by the update service so the
//! exposed address space has observable motion without real hardware.
//!
//! # Value Rules
//!
//! [`SimulatedValueGenerator`] produces, per declared type:
//!
//! - `Double` - uniform in [[`DOUBLE_MIN`], [`DOUBLE_MAX`]], rounded to
//!   [`DOUBLE_DECIMALS`] decimal places
//! - `Integer` - uniform in [0, [`INTEGER_UPPER_BOUND`])
//! - `Boolean` - a fair coin flip
//! - `String` - `Status_HHMMSS` from the local wall clock
//!
//! # Reproducibility
//!
//! A generator built with [`SimulatedValueGenerator::with_seed`] yields the
//! same numeric sequence for the same sequence of requests.
//!
//! ```ignore
//! use asset_signal_server::backend::simulation::{SimulatedValueGenerator, ValueGenerator};
//! use asset_signal_server::types::{SignalDataType, SignalValue};
//!
//! let mut generator = SimulatedValueGenerator::with_seed(7);
//! let value = generator.next_value(SignalDataType::Double, &SignalValue::Double(0.0));
//! ```

use crate::types::{SignalDataType, SignalValue};
use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Lower bound of simulated doubles
pub const DOUBLE_MIN: f64 = 50.0;

/// Upper bound of simulated doubles
pub const DOUBLE_MAX: f64 = 100.0;

/// Decimal places kept on simulated doubles
pub const DOUBLE_DECIMALS: u32 = 2;

/// Exclusive upper bound of simulated integers
pub const INTEGER_UPPER_BOUND: i32 = 100;

/// Source of replacement values for a sweep
pub trait ValueGenerator: Send {
    /// Produce the next value for a signal of `data_type` currently holding `current`
    fn next_value(&mut self, data_type: SignalDataType, current: &SignalValue) -> SignalValue;
}

/// Random values within fixed per-type ranges
#[derive(Debug)]
pub struct SimulatedValueGenerator {
    rng: StdRng,
}

impl SimulatedValueGenerator {
    /// Generator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generator with a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fixed seed when given, entropy otherwise
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::new(),
        }
    }
}

impl Default for SimulatedValueGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueGenerator for SimulatedValueGenerator {
    fn next_value(&mut self, data_type: SignalDataType, _current: &SignalValue) -> SignalValue {
        match data_type {
            SignalDataType::Double => {
                let raw = self.rng.gen_range(DOUBLE_MIN..=DOUBLE_MAX);
                SignalValue::Double(round_to_decimals(raw, DOUBLE_DECIMALS))
            }
            SignalDataType::Integer => {
                SignalValue::Integer(self.rng.gen_range(0..INTEGER_UPPER_BOUND))
            }
            SignalDataType::Boolean => SignalValue::Boolean(self.rng.gen_bool(0.5)),
            SignalDataType::String => SignalValue::String(status_string(Local::now())),
        }
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Synthetic status text for a wall-clock instant
pub fn status_string(now: DateTime<Local>) -> String {
    format!("Status_{}", now.format("%H%M%S"))
}

/// Number of decimal places needed to print `value` exactly (up to 10)
pub fn decimal_places(value: f64) -> u32 {
    let mut scaled = value;
    for places in 0..=10 {
        if (scaled - scaled.round()).abs() < 1e-6 {
            return places;
        }
        scaled *= 10.0;
    }
    10
}
