//! Analysis decision graph.
//!
//! The ADG summarizes which decisions are resolved before which, and which
//! of those orderings are genuine branches.

use serde::Serialize;

use crate::identifier::Id;

/// Kind of an ADG edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Plain ordering dependency.
    Order,
    /// The source decision changes which code the target runs in.
    Procedural,
}

/// A decision node.
///
/// `id` is unique within the graph. `name` is the decision it stands for;
/// the same decision reused in unrelated places yields several nodes with
/// one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdgNode {
    pub id: String,
    pub name: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdgEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

/// The analysis decision graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Adg {
    nodes: Vec<AdgNode>,
    edges: Vec<AdgEdge>,
}

impl Adg {
    pub fn new(nodes: Vec<AdgNode>, edges: Vec<AdgEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[AdgNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[AdgEdge] {
        &self.edges
    }

    /// The branch-implying subset of the edges.
    pub fn proc_edges(&self) -> impl Iterator<Item = &AdgEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.kind == EdgeKind::Procedural)
    }

    /// Distinct decision names exercised by the graph, in node order.
    pub fn decision_names(&self) -> Vec<Id> {
        let mut names = Vec::new();
        for node in &self.nodes {
            if !names.contains(&node.name) {
                names.push(node.name);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let adg = Adg::new(
            vec![
                AdgNode {
                    id: "A".to_string(),
                    name: Id::new("A"),
                },
                AdgNode {
                    id: "cutoff".to_string(),
                    name: Id::new("cutoff"),
                },
            ],
            vec![AdgEdge {
                source: "A".to_string(),
                target: "cutoff".to_string(),
                kind: EdgeKind::Procedural,
            }],
        );
        let json = serde_json::to_value(&adg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nodes": [{"id": "A", "name": "A"}, {"id": "cutoff", "name": "cutoff"}],
                "edges": [{"source": "A", "target": "cutoff", "type": "procedural"}],
            })
        );
        assert_eq!(adg.proc_edges().count(), 1);
        assert_eq!(adg.decision_names(), vec![Id::new("A"), Id::new("cutoff")]);
    }
}
