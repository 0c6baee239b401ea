//! Exposed address space
//!
//! A folder-per-asset, variable-per-signal tree built once from the registry
//! and refreshed on every sync tick. The exposure layer reads it through a
//! [`SharedAddressSpace`].
//!
//! - [`node`] - Node index, node kinds, wire types and read results
//! - [`tree`] - Flat-storage [`AddressSpace`]
//! - [`bridge`] - [`AddressSpaceBridge`]: build and sync from the registry

pub mod bridge;
pub mod node;
pub mod tree;

pub use bridge::{lock_space, AddressSpaceBridge, BuildReport, SharedAddressSpace, SyncReport};
pub use node::{
    AddressNode, BrowseEntry, NodeIdx, NodeKind, NodeReading, StatusCode, VariableState,
    WireDataType,
};
pub use tree::{variable_node_id, AddressSpace, ChildIter, ROOT_NODE_ID};
