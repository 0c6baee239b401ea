//! Server hosting
//!
//! - [`endpoint`] - The [`ExposureServer`] seam and the in-process [`LocalEndpoint`]
//! - [`host`] - [`AssetServer`]: initialize and shutdown orchestration

pub mod endpoint;
pub mod host;

pub use endpoint::{ExposureServer, LocalEndpoint, PKI_SUBDIRS};
pub use host::{AssetServer, ServerState};
