//! Node types of the exposed address space.
//!
//! All nodes live in one flat `Vec` inside [`AddressSpace`](super::AddressSpace)
//! and are addressed by [`NodeIdx`], a direct index into that storage.

use crate::types::{Quality, SignalDataType, SignalSample, SignalValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into the node storage of an address space.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    pub const INVALID: NodeIdx = NodeIdx(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "NodeIdx(INVALID)")
        } else {
            write!(f, "NodeIdx({})", self.0)
        }
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Wire-level data type announced for a variable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireDataType {
    Double,
    Int32,
    Boolean,
    String,
    /// Fallback for anything without a dedicated wire type
    BaseDataType,
}

impl WireDataType {
    /// Map a declared type name (`"Double"`, `"Integer"`, ...) to its wire type.
    ///
    /// Unknown names map to [`WireDataType::BaseDataType`].
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Double" => WireDataType::Double,
            "Integer" => WireDataType::Int32,
            "Boolean" => WireDataType::Boolean,
            "String" => WireDataType::String,
            _ => WireDataType::BaseDataType,
        }
    }
}

impl From<SignalDataType> for WireDataType {
    fn from(data_type: SignalDataType) -> Self {
        match data_type {
            SignalDataType::Double => WireDataType::Double,
            SignalDataType::Integer => WireDataType::Int32,
            SignalDataType::Boolean => WireDataType::Boolean,
            SignalDataType::String => WireDataType::String,
        }
    }
}

impl fmt::Display for WireDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireDataType::Double => "Double",
            WireDataType::Int32 => "Int32",
            WireDataType::Boolean => "Boolean",
            WireDataType::String => "String",
            WireDataType::BaseDataType => "BaseDataType",
        };
        f.write_str(name)
    }
}

/// Status marker of an exposed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusCode {
    #[default]
    Good,
}

impl From<Quality> for StatusCode {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Good => StatusCode::Good,
        }
    }
}

/// Mutable state of a variable (leaf) node.
#[derive(Debug, Clone)]
pub struct VariableState {
    /// Owning asset in the registry.
    pub asset_name: String,
    /// Backing signal in the registry.
    pub signal_name: String,
    pub data_type: WireDataType,
    pub value: SignalValue,
    /// Time the backing signal last accepted a value.
    pub source_timestamp: DateTime<Utc>,
    /// Time of the last sync.
    pub server_timestamp: DateTime<Utc>,
    pub status: StatusCode,
    /// Bumped on every sync, starts at 0.
    pub version: u64,
    /// Set by a sync, cleared by [`AddressSpace::take_changes`](super::AddressSpace::take_changes).
    pub changed: bool,
}

impl VariableState {
    pub fn new(
        asset_name: impl Into<String>,
        signal_name: impl Into<String>,
        data_type: WireDataType,
        sample: SignalSample,
        server_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            asset_name: asset_name.into(),
            signal_name: signal_name.into(),
            data_type,
            value: sample.value,
            source_timestamp: sample.timestamp,
            server_timestamp,
            status: sample.quality.into(),
            version: 0,
            changed: false,
        }
    }

    /// Overwrite value, timestamps and status from a fresh signal sample.
    pub fn apply(&mut self, sample: SignalSample, server_timestamp: DateTime<Utc>) {
        self.value = sample.value;
        self.source_timestamp = sample.timestamp;
        self.server_timestamp = server_timestamp;
        self.status = sample.quality.into();
        self.version += 1;
        self.changed = true;
    }
}

/// What kind of node this is.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Folder,
    Variable(VariableState),
}

/// A single node in the address space.
#[derive(Debug, Clone)]
pub struct AddressNode {
    pub idx: NodeIdx,
    /// Unique identifier, e.g. `"Pump_01"` or `"Pump_01.Flow"`.
    pub node_id: String,
    /// Display name, e.g. `"Flow"`.
    pub browse_name: String,
    /// Parent node (INVALID for the root).
    pub parent: NodeIdx,
    /// First child (intrusive linked list).
    pub first_child: NodeIdx,
    /// Next sibling (intrusive linked list).
    pub next_sibling: NodeIdx,
    pub kind: NodeKind,
}

impl AddressNode {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn variable(&self) -> Option<&VariableState> {
        match &self.kind {
            NodeKind::Variable(state) => Some(state),
            NodeKind::Folder => None,
        }
    }

    pub fn variable_mut(&mut self) -> Option<&mut VariableState> {
        match &mut self.kind {
            NodeKind::Variable(state) => Some(state),
            NodeKind::Folder => None,
        }
    }
}

/// Copy of a variable node as a client would read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReading {
    pub node_id: String,
    pub data_type: WireDataType,
    pub value: SignalValue,
    pub source_timestamp: DateTime<Utc>,
    pub server_timestamp: DateTime<Utc>,
    pub status: StatusCode,
    pub version: u64,
}

impl NodeReading {
    pub(crate) fn from_state(node_id: &str, state: &VariableState) -> Self {
        Self {
            node_id: node_id.to_string(),
            data_type: state.data_type,
            value: state.value.clone(),
            source_timestamp: state.source_timestamp,
            server_timestamp: state.server_timestamp,
            status: state.status,
            version: state.version,
        }
    }
}

/// One child reference returned by a browse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseEntry {
    pub node_id: String,
    pub browse_name: String,
    pub is_folder: bool,
}
