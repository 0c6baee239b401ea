//! Flat-storage address space.
//!
//! Nodes are stored in a `Vec` indexed by [`NodeIdx`], with parent/child/sibling
//! links forming an intrusive tree and a `HashMap` from node id to index for
//! O(1) lookups:
//!
//! ```text
//! Assets                    (folder, root)
//! +-- Pump_01               (folder)
//! |   +-- Pump_01.Flow      (variable, Double)
//! |   +-- Pump_01.Running   (variable, Boolean)
//! +-- Valve_01              (folder)
//!     +-- Valve_01.Open     (variable, Boolean)
//! ```
//!
//! The tree only grows; nodes are never removed.

use super::node::{
    AddressNode, BrowseEntry, NodeIdx, NodeKind, NodeReading, VariableState,
};
use crate::error::{AssetServerError, Result};
use std::collections::HashMap;

/// Identifier and browse name of the single root folder.
pub const ROOT_NODE_ID: &str = "Assets";

/// Composite identifier of a signal's variable node.
pub fn variable_node_id(asset_name: &str, signal_name: &str) -> String {
    format!("{}.{}", asset_name, signal_name)
}

/// Hierarchical, addressable view of the registry.
#[derive(Debug)]
pub struct AddressSpace {
    namespace_uri: String,
    nodes: Vec<AddressNode>,
    id_index: HashMap<String, NodeIdx>,
    root: NodeIdx,
}

impl AddressSpace {
    pub fn new(namespace_uri: impl Into<String>) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            nodes: Vec::new(),
            id_index: HashMap::new(),
            root: NodeIdx::INVALID,
        }
    }

    /// Namespace all nodes live in.
    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    /// Total number of nodes, folders included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True once the root folder exists.
    pub fn is_built(&self) -> bool {
        self.root.is_valid()
    }

    pub fn root(&self) -> NodeIdx {
        self.root
    }

    /// Create the root folder. Fails if it already exists.
    pub fn add_root(&mut self) -> Result<NodeIdx> {
        if self.root.is_valid() {
            return Err(AssetServerError::AddressSpace(format!(
                "root folder '{}' already exists",
                ROOT_NODE_ID
            )));
        }
        let idx = self.push_node(NodeIdx::INVALID, ROOT_NODE_ID, ROOT_NODE_ID, NodeKind::Folder)?;
        self.root = idx;
        Ok(idx)
    }

    /// Add a folder under `parent`.
    pub fn add_folder(&mut self, parent: NodeIdx, node_id: &str, browse_name: &str) -> Result<NodeIdx> {
        self.check_parent(parent)?;
        self.push_node(parent, node_id, browse_name, NodeKind::Folder)
    }

    /// Add a variable under `parent`; its id is `"{asset}.{signal}"`.
    pub fn add_variable(&mut self, parent: NodeIdx, state: VariableState) -> Result<NodeIdx> {
        self.check_parent(parent)?;
        let node_id = variable_node_id(&state.asset_name, &state.signal_name);
        let browse_name = state.signal_name.clone();
        self.push_node(parent, &node_id, &browse_name, NodeKind::Variable(state))
    }

    /// Get a node by index (O(1) array index).
    #[inline]
    pub fn get(&self, idx: NodeIdx) -> Option<&AddressNode> {
        if idx.is_valid() {
            self.nodes.get(idx.index())
        } else {
            None
        }
    }

    /// Look up by node id (O(1) HashMap).
    pub fn lookup(&self, node_id: &str) -> Option<NodeIdx> {
        self.id_index.get(node_id).copied()
    }

    /// Iterate over children of a node in insertion order.
    pub fn children(&self, parent: NodeIdx) -> ChildIter<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeIdx::INVALID);
        ChildIter {
            space: self,
            current: first,
        }
    }

    /// Iterate over variable nodes in insertion order.
    pub fn variables(&self) -> impl Iterator<Item = (&AddressNode, &VariableState)> {
        self.nodes
            .iter()
            .filter_map(|n| n.variable().map(|state| (n, state)))
    }

    /// Mutable access to every variable node.
    pub fn variables_mut(&mut self) -> impl Iterator<Item = &mut VariableState> {
        self.nodes.iter_mut().filter_map(|n| n.variable_mut())
    }

    pub fn variable_count(&self) -> usize {
        self.variables().count()
    }

    /// Number of folders, root included.
    pub fn folder_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_folder()).count()
    }

    /// Current state of one variable node.
    pub fn read(&self, node_id: &str) -> Option<NodeReading> {
        let node = self.get(self.lookup(node_id)?)?;
        node.variable()
            .map(|state| NodeReading::from_state(&node.node_id, state))
    }

    /// Children of a folder, `None` if the id is unknown or not a folder.
    pub fn browse(&self, node_id: &str) -> Option<Vec<BrowseEntry>> {
        let idx = self.lookup(node_id)?;
        if !self.get(idx)?.is_folder() {
            return None;
        }
        Some(
            self.children(idx)
                .map(|child| BrowseEntry {
                    node_id: child.node_id.clone(),
                    browse_name: child.browse_name.clone(),
                    is_folder: child.is_folder(),
                })
                .collect(),
        )
    }

    /// Current state of every variable node.
    pub fn snapshot(&self) -> Vec<NodeReading> {
        self.variables()
            .map(|(node, state)| NodeReading::from_state(&node.node_id, state))
            .collect()
    }

    /// Ids of variables changed since the last call, clearing their flags.
    pub fn take_changes(&mut self) -> Vec<String> {
        let mut changed = Vec::new();
        for node in &mut self.nodes {
            if let NodeKind::Variable(state) = &mut node.kind {
                if state.changed {
                    state.changed = false;
                    changed.push(node.node_id.clone());
                }
            }
        }
        changed
    }

    fn check_parent(&self, parent: NodeIdx) -> Result<()> {
        match self.get(parent) {
            Some(node) if node.is_folder() => Ok(()),
            Some(node) => Err(AssetServerError::AddressSpace(format!(
                "parent '{}' is not a folder",
                node.node_id
            ))),
            None => Err(AssetServerError::AddressSpace(format!(
                "unknown parent {}",
                parent
            ))),
        }
    }

    fn push_node(
        &mut self,
        parent: NodeIdx,
        node_id: &str,
        browse_name: &str,
        kind: NodeKind,
    ) -> Result<NodeIdx> {
        if self.id_index.contains_key(node_id) {
            return Err(AssetServerError::AddressSpace(format!(
                "duplicate node id '{}'",
                node_id
            )));
        }

        let idx = NodeIdx(self.nodes.len() as u32);
        self.nodes.push(AddressNode {
            idx,
            node_id: node_id.to_string(),
            browse_name: browse_name.to_string(),
            parent,
            first_child: NodeIdx::INVALID,
            next_sibling: NodeIdx::INVALID,
            kind,
        });
        self.id_index.insert(node_id.to_string(), idx);

        if parent.is_valid() {
            self.link_child(parent, idx);
        }
        Ok(idx)
    }

    fn link_child(&mut self, parent: NodeIdx, child: NodeIdx) {
        let first = self.nodes[parent.index()].first_child;
        if !first.is_valid() {
            self.nodes[parent.index()].first_child = child;
            return;
        }

        // Walk to end of sibling chain
        let mut cur = first;
        loop {
            let next = self.nodes[cur.index()].next_sibling;
            if !next.is_valid() {
                self.nodes[cur.index()].next_sibling = child;
                break;
            }
            cur = next;
        }
    }
}

/// Iterator over the children of a node.
pub struct ChildIter<'a> {
    space: &'a AddressSpace,
    current: NodeIdx,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = &'a AddressNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.space.get(self.current)?;
        self.current = node.next_sibling;
        Some(node)
    }
}
