//! Exposure layer seam and the in-process endpoint
//!
//! [`ExposureServer`] is the boundary to whatever serves the address space to
//! clients. [`LocalEndpoint`] is the in-process implementation shipped with
//! the crate: it performs the readiness checks of a protocol server
//! (endpoint validation, certificate store layout) and serves reads, browses
//! and change notifications straight from the shared tree, without any wire
//! protocol.

use crate::address_space::{lock_space, BrowseEntry, NodeReading, SharedAddressSpace};
use crate::config::ServerConfig;
use crate::error::{AssetServerError, Result};
use std::path::PathBuf;

/// Subdirectories of the certificate store
pub const PKI_SUBDIRS: &[&str] = &["own", "trusted", "issuer", "rejected"];

/// Serves an address space to clients
#[cfg_attr(test, mockall::automock)]
pub trait ExposureServer: Send {
    /// Start serving `space`; fails with a startup error if not possible
    fn start(&mut self, space: SharedAddressSpace) -> Result<()>;

    /// Stop serving. Stopping a stopped server is a no-op.
    fn stop(&mut self) -> Result<()>;

    /// Endpoint clients connect to
    fn endpoint_url(&self) -> String;

    fn is_running(&self) -> bool;
}

/// In-process exposure of the address space
#[derive(Debug)]
pub struct LocalEndpoint {
    config: ServerConfig,
    space: Option<SharedAddressSpace>,
}

impl LocalEndpoint {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            space: None,
        }
    }

    /// Root of the certificate store this endpoint uses
    pub fn pki_root(&self) -> PathBuf {
        self.config.pki_root()
    }

    /// Read one variable node
    pub fn read(&self, node_id: &str) -> Result<NodeReading> {
        let space = self.serving()?;
        let reading = lock_space(space).read(node_id);
        reading.ok_or_else(|| {
            AssetServerError::AddressSpace(format!("unknown variable node '{}'", node_id))
        })
    }

    /// List the children of a folder node
    pub fn browse(&self, node_id: &str) -> Result<Vec<BrowseEntry>> {
        let space = self.serving()?;
        let entries = lock_space(space).browse(node_id);
        entries.ok_or_else(|| {
            AssetServerError::AddressSpace(format!("unknown folder node '{}'", node_id))
        })
    }

    /// Readings of every variable changed since the last poll
    pub fn poll_notifications(&self) -> Result<Vec<NodeReading>> {
        let space = self.serving()?;
        let mut space = lock_space(space);
        let changed = space.take_changes();
        Ok(changed.iter().filter_map(|id| space.read(id)).collect())
    }

    fn serving(&self) -> Result<&SharedAddressSpace> {
        self.space.as_ref().ok_or_else(|| {
            AssetServerError::AddressSpace("endpoint is not running".to_string())
        })
    }

    fn prepare_pki(&self) -> Result<PathBuf> {
        let root = self.pki_root();
        for dir in PKI_SUBDIRS {
            let path = root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| {
                AssetServerError::Startup(format!(
                    "failed to create certificate store {:?}: {}",
                    path, e
                ))
            })?;
        }
        Ok(root)
    }
}

impl ExposureServer for LocalEndpoint {
    fn start(&mut self, space: SharedAddressSpace) -> Result<()> {
        if self.space.is_some() {
            return Err(AssetServerError::Startup(
                "endpoint is already running".to_string(),
            ));
        }

        let (host, port) = self.config.endpoint_host_port().ok_or_else(|| {
            AssetServerError::Startup(format!(
                "invalid endpoint url '{}'",
                self.config.endpoint_url
            ))
        })?;

        if !lock_space(&space).is_built() {
            return Err(AssetServerError::Startup(
                "address space must be built before the endpoint starts".to_string(),
            ));
        }

        let pki_root = self.prepare_pki()?;
        if self.config.auto_accept_untrusted {
            tracing::warn!("Untrusted client certificates are accepted automatically");
        }

        tracing::info!(
            application = %self.config.application_name,
            %host,
            port,
            pki = ?pki_root,
            "Endpoint ready"
        );
        self.space = Some(space);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.space.take().is_some() {
            tracing::info!(endpoint = %self.config.endpoint_url, "Endpoint stopped");
        }
        Ok(())
    }

    fn endpoint_url(&self) -> String {
        self.config.endpoint_url.clone()
    }

    fn is_running(&self) -> bool {
        self.space.is_some()
    }
}
