//! Storage-node (SNode) tree
//!
//! Storage nodes describe the hierarchical sparse data structure that pointer
//! computations address. Every node except the root has a parent. Children of
//! a [`SNodeType::BitStruct`] are packed sub-fields sharing one physical word;
//! they and their descendants are flagged `is_bit_level`.

use super::SNodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a storage node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SNodeType {
    Root,
    Dense,
    Pointer,
    Bitmasked,
    Dynamic,
    /// Physical container packing several sub-word fields
    BitStruct,
    /// Leaf holding one scalar field
    Place,
}

impl fmt::Display for SNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SNodeType::Root => "root",
            SNodeType::Dense => "dense",
            SNodeType::Pointer => "pointer",
            SNodeType::Bitmasked => "bitmasked",
            SNodeType::Dynamic => "dynamic",
            SNodeType::BitStruct => "bit_struct",
            SNodeType::Place => "place",
        };
        f.write_str(name)
    }
}

/// A node of the storage tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SNode {
    pub id: SNodeId,
    pub kind: SNodeType,
    #[serde(default)]
    pub parent: Option<SNodeId>,
    /// Packed sub-field of a bit-struct
    #[serde(default)]
    pub is_bit_level: bool,
    /// Number of loop dimensions a struct-for over this node iterates
    #[serde(default)]
    pub num_active_indices: usize,
    #[serde(default)]
    pub name: Option<String>,
}

/// Arena of storage nodes. Node 0 is always the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SNodeTree {
    nodes: Vec<SNode>,
}

impl SNodeTree {
    /// Create a tree holding only the root node
    pub fn new() -> Self {
        Self {
            nodes: vec![SNode {
                id: SNodeId::new(0),
                kind: SNodeType::Root,
                parent: None,
                is_bit_level: false,
                num_active_indices: 0,
                name: Some("root".to_string()),
            }],
        }
    }

    pub fn root(&self) -> SNodeId {
        SNodeId::new(0)
    }

    /// Append a child of `parent`.
    ///
    /// Bit-level status is inherited: children of a bit-struct, and anything
    /// below a bit-level node, are bit-level.
    pub fn add_child(
        &mut self,
        parent: SNodeId,
        kind: SNodeType,
        num_active_indices: usize,
    ) -> SNodeId {
        let is_bit_level = self
            .get(parent)
            .map(|p| p.kind == SNodeType::BitStruct || p.is_bit_level)
            .unwrap_or(false);
        let id = SNodeId::new(self.nodes.len() as u32);
        self.nodes.push(SNode {
            id,
            kind,
            parent: Some(parent),
            is_bit_level,
            num_active_indices,
            name: None,
        });
        id
    }

    /// Append a named child of `parent`
    pub fn add_named_child(
        &mut self,
        parent: SNodeId,
        kind: SNodeType,
        num_active_indices: usize,
        name: &str,
    ) -> SNodeId {
        let id = self.add_child(parent, kind, num_active_indices);
        self.nodes[id.index()].name = Some(name.to_string());
        id
    }

    pub fn get(&self, id: SNodeId) -> Option<&SNode> {
        self.nodes.get(id.index())
    }

    pub fn contains(&self, id: SNodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SNode> {
        self.nodes.iter()
    }

    pub fn parent(&self, id: SNodeId) -> Option<SNodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn is_bit_level(&self, id: SNodeId) -> bool {
        self.get(id).map(|n| n.is_bit_level).unwrap_or(false)
    }

    pub fn num_active_indices(&self, id: SNodeId) -> Option<usize> {
        self.get(id).map(|n| n.num_active_indices)
    }

    /// Nearest ancestor-or-self that is not bit-level: the physical container
    /// of a packed sub-field.
    ///
    /// Returns `None` if the chain of bit-level nodes ends without a parent,
    /// if `id` is unknown, or if the chain is longer than the tree (a parent
    /// cycle).
    pub fn container_of(&self, id: SNodeId) -> Option<SNodeId> {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            let node = self.get(current)?;
            if !node.is_bit_level {
                return Some(current);
            }
            current = node.parent?;
        }
        None
    }

    /// Human-readable label, e.g. `S3:place(x)`
    pub fn label(&self, id: SNodeId) -> String {
        match self.get(id) {
            Some(SNode { kind, name: Some(name), .. }) => format!("{}:{}({})", id, kind, name),
            Some(SNode { kind, .. }) => format!("{}:{}", id, kind),
            None => format!("{}:?", id),
        }
    }
}

impl Default for SNodeTree {
    fn default() -> Self {
        Self::new()
    }
}
