//! Flow graph over block nodes.
//!
//! Nodes are block ids (`A`, or `A:std` for options of block-level
//! decisions). Edges keep insertion order so that path enumeration, and
//! therefore universe numbering, is deterministic.

use indexmap::{IndexMap, IndexSet};

use crate::identifier::Id;

/// Directed graph describing the order in which blocks are concatenated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowGraph {
    nodes: IndexSet<Id>,
    edges: IndexMap<Id, Vec<Id>>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, node: Id) {
        self.nodes.insert(node);
    }

    /// Add an edge, inserting both endpoints. Duplicate edges are ignored.
    pub fn add_edge(&mut self, source: Id, target: Id) {
        self.add_node(source);
        self.add_node(target);
        let children = self.edges.entry(source).or_default();
        if !children.contains(&target) {
            children.push(target);
        }
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = Id> + '_ {
        self.nodes.iter().copied()
    }

    pub fn contains(&self, node: Id) -> bool {
        self.nodes.contains(&node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges as `(source, target)` pairs in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (Id, Id)> + '_ {
        self.edges
            .iter()
            .flat_map(|(source, targets)| targets.iter().map(move |target| (*source, *target)))
    }

    /// Direct successors of `node`.
    pub fn children(&self, node: Id) -> &[Id] {
        self.edges
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Nodes without incoming edges.
    pub fn sources(&self) -> Vec<Id> {
        let targets: IndexSet<Id> = self.edges.values().flatten().copied().collect();
        self.nodes
            .iter()
            .copied()
            .filter(|node| !targets.contains(node))
            .collect()
    }

    /// Nodes without outgoing edges.
    pub fn sinks(&self) -> Vec<Id> {
        self.nodes
            .iter()
            .copied()
            .filter(|node| self.children(*node).is_empty())
            .collect()
    }
}
