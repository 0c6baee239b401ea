//! Error handling for the asset signal server
//!
//! This module defines the crate error type and a Result alias for use
//! throughout the registry, the address-space bridge and the server host.

use crate::types::SignalDataType;
use thiserror::Error;

/// Main error type for asset signal server operations
#[derive(Error, Debug)]
pub enum AssetServerError {
    /// The signal provider failed, or had no data for an asset
    #[error("Provider error: {0}")]
    Provider(String),

    /// A value does not match the declared type of its signal
    #[error("Validation error: signal '{signal}' expects {expected} but got {actual}")]
    Validation {
        signal: String,
        expected: SignalDataType,
        actual: SignalDataType,
    },

    /// An asset or signal name is empty
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// A signal with the same name already exists on the asset
    #[error("Duplicate signal '{signal}' on asset '{asset}'")]
    DuplicateName { asset: String, signal: String },

    /// Misuse of the exposed node tree (second build, duplicate node id)
    #[error("Address space error: {0}")]
    AddressSpace(String),

    /// The server could not reach a ready state
    #[error("Startup error: {0}")]
    Startup(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Timeout: {0}")]
    Timeout(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AssetServerError>,
    },
}

impl AssetServerError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AssetServerError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed
    pub fn root(&self) -> &AssetServerError {
        match self {
            AssetServerError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for value/type mismatches and empty names
    pub fn is_validation(&self) -> bool {
        matches!(
            self.root(),
            AssetServerError::Validation { .. } | AssetServerError::InvalidName(_)
        )
    }
}

/// Result type alias for asset signal server operations
pub type Result<T> = std::result::Result<T, AssetServerError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
