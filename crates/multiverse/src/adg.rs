//! Analysis decision graph construction.
//!
//! The flow graph is first augmented so that each block node is followed by
//! the placeholder decisions it contains. Nodes are then merged by identity:
//! the alternatives of a block-level decision fold into one node, and a
//! placeholder folds with the same placeholder in the other alternatives of
//! its host block. Pruning keeps decision nodes only, and the surviving edges
//! are classified as ordering or procedural.

use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, info};
use petgraph::{
    algo::has_path_connecting,
    graph::{DiGraph, NodeIndex},
};

use multiverse_core::{
    adg::{Adg, AdgEdge, AdgNode, EdgeKind},
    constraint::{ConstraintOrigin, ConstraintTarget},
    identifier::Id,
    program::Program,
};

/// Identity of a merged node.
///
/// Blocks are identified by their name. Placeholders are identified by their
/// decision within a host block name, so one decision used in unrelated
/// blocks stays several nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    name: Id,
    host: Option<Id>,
}

impl Key {
    fn is_placeholder(&self) -> bool {
        self.host.is_some()
    }
}

/// Flow graph with placeholder nodes chained after their blocks.
struct Augmented {
    keys: Vec<Key>,
    children: Vec<Vec<usize>>,
    sources: Vec<usize>,
}

impl Augmented {
    fn new(program: &Program) -> Self {
        let template = program.template();
        let flow = program.graph();
        let mut augmented = Self {
            keys: Vec::new(),
            children: Vec::new(),
            sources: Vec::new(),
        };
        let mut ends: HashMap<Id, (usize, usize)> = HashMap::new();

        for node in flow.nodes() {
            let block = template.block(node);
            let name = block.map_or(node, |block| block.name());
            let first = augmented.push(Key { name, host: None });
            let mut last = first;
            for variable in block.map(|block| block.variables()).unwrap_or_default() {
                let next = augmented.push(Key {
                    name: variable,
                    host: Some(name),
                });
                augmented.children[last].push(next);
                last = next;
            }
            ends.insert(node, (first, last));
        }
        for (source, target) in flow.edges() {
            let (_, last) = ends[&source];
            let (first, _) = ends[&target];
            augmented.children[last].push(first);
        }
        augmented.sources = flow.sources().iter().map(|node| ends[node].0).collect();
        augmented
    }

    fn push(&mut self, key: Key) -> usize {
        self.keys.push(key);
        self.children.push(Vec::new());
        self.keys.len() - 1
    }
}

/// A node of the merged graph and the augmented nodes folded into it.
struct MergedNode {
    key: Key,
    members: Vec<usize>,
    expanded: usize,
    children: Vec<usize>,
}

/// Arena of merged nodes addressed by index.
struct Merged {
    nodes: Vec<MergedNode>,
    index: HashMap<Key, usize>,
    graph: DiGraph<usize, ()>,
}

impl Merged {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            graph: DiGraph::new(),
        }
    }

    /// Fold `member` into the node for `key`. Returns the node and whether
    /// it gained a member.
    fn join(&mut self, key: Key, member: usize) -> (usize, bool) {
        let index = match self.index.get(&key) {
            Some(index) => *index,
            None => {
                let index = self.nodes.len();
                self.nodes.push(MergedNode {
                    key,
                    members: Vec::new(),
                    expanded: 0,
                    children: Vec::new(),
                });
                self.graph.add_node(index);
                self.index.insert(key, index);
                index
            }
        };
        let node = &mut self.nodes[index];
        if node.members.contains(&member) {
            return (index, false);
        }
        node.members.push(member);
        (index, true)
    }

    /// Add `source -> target` unless it is a self loop, a duplicate or would
    /// close a cycle.
    fn connect(&mut self, source: usize, target: usize) {
        if source == target || self.nodes[source].children.contains(&target) {
            return;
        }
        if has_path_connecting(
            &self.graph,
            NodeIndex::new(target),
            NodeIndex::new(source),
            None,
        ) {
            debug!(
                source:% = self.nodes[source].key.name,
                target:% = self.nodes[target].key.name;
                "Merged edge would close a cycle"
            );
            return;
        }
        self.nodes[source].children.push(target);
        self.graph
            .add_edge(NodeIndex::new(source), NodeIndex::new(target), ());
    }
}

/// Merge the augmented graph breadth first from its sources.
fn merge(augmented: &Augmented) -> Merged {
    let mut merged = Merged::new();
    let mut queue = VecDeque::new();
    for source in &augmented.sources {
        let (index, _) = merged.join(augmented.keys[*source], *source);
        queue.push_back(index);
    }

    while let Some(index) = queue.pop_front() {
        let start = merged.nodes[index].expanded;
        let members = merged.nodes[index].members[start..].to_vec();
        merged.nodes[index].expanded += members.len();
        for member in members {
            for child in &augmented.children[member] {
                let (target, grown) = merged.join(augmented.keys[*child], *child);
                merged.connect(index, target);
                if grown {
                    queue.push_back(target);
                }
            }
        }
    }
    debug!(nodes = merged.nodes.len(); "Alternatives merged");
    merged
}

/// Decision-only graph under construction.
struct Pruned {
    keys: Vec<Key>,
    edges: Vec<(usize, usize, EdgeKind)>,
    graph: DiGraph<usize, ()>,
}

impl Pruned {
    /// Keep decision nodes; connect two of them when the merged graph has a
    /// path between them through non-decision nodes only.
    fn new(merged: &Merged, is_decision: impl Fn(Key) -> bool) -> Self {
        let kept: Vec<usize> = (0..merged.nodes.len())
            .filter(|index| is_decision(merged.nodes[*index].key))
            .collect();
        let position: HashMap<usize, usize> =
            kept.iter().enumerate().map(|(i, index)| (*index, i)).collect();

        let mut pruned = Self {
            keys: kept.iter().map(|index| merged.nodes[*index].key).collect(),
            edges: Vec::new(),
            graph: DiGraph::new(),
        };
        for i in 0..kept.len() {
            pruned.graph.add_node(i);
        }

        for (source, index) in kept.iter().enumerate() {
            let mut seen = HashSet::new();
            let mut stack: Vec<usize> = merged.nodes[*index].children.iter().rev().copied().collect();
            while let Some(next) = stack.pop() {
                if !seen.insert(next) {
                    continue;
                }
                match position.get(&next) {
                    Some(target) => pruned.add(source, *target, EdgeKind::Order),
                    None => stack.extend(merged.nodes[next].children.iter().rev()),
                }
            }
        }
        pruned
    }

    fn add(&mut self, source: usize, target: usize, kind: EdgeKind) {
        self.edges.push((source, target, kind));
        self.graph
            .add_edge(NodeIndex::new(source), NodeIndex::new(target), ());
    }

    /// Mark the out-edges of every branching node as procedural.
    fn mark_branches(&mut self) {
        let mut degree = vec![0usize; self.keys.len()];
        for (source, _, _) in &self.edges {
            degree[*source] += 1;
        }
        for (source, _, kind) in &mut self.edges {
            if degree[*source] > 1 {
                *kind = EdgeKind::Procedural;
            }
        }
    }

    /// Add or upgrade a procedural edge unless it would close a cycle.
    fn procedural(&mut self, source: usize, target: usize) {
        if source == target {
            return;
        }
        if let Some(edge) = self
            .edges
            .iter_mut()
            .find(|(s, t, _)| *s == source && *t == target)
        {
            edge.2 = EdgeKind::Procedural;
            return;
        }
        if has_path_connecting(
            &self.graph,
            NodeIndex::new(target),
            NodeIndex::new(source),
            None,
        ) {
            debug!(
                source:% = self.keys[source].name,
                target:% = self.keys[target].name;
                "Constraint edge would close a cycle"
            );
            return;
        }
        self.add(source, target, EdgeKind::Procedural);
    }

    fn nodes_named(&self, name: Id) -> Vec<usize> {
        (0..self.keys.len())
            .filter(|i| self.keys[*i].name == name)
            .collect()
    }

    /// Unique ids: the first node with a name gets it bare, later ones a
    /// numeric suffix.
    fn ids(&self) -> Vec<String> {
        let mut used = HashSet::new();
        let mut counts: HashMap<Id, usize> = HashMap::new();
        self.keys
            .iter()
            .map(|key| {
                let count = counts.entry(key.name).or_insert(0);
                let mut id = key.name.to_string();
                while !used.insert(id.clone()) {
                    *count += 1;
                    id = format!("{}-{}", key.name, *count + 1);
                }
                id
            })
            .collect()
    }

    fn into_adg(self) -> Adg {
        let ids = self.ids();
        let nodes = self
            .keys
            .iter()
            .zip(&ids)
            .map(|(key, id)| AdgNode {
                id: id.clone(),
                name: key.name,
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|(source, target, kind)| AdgEdge {
                source: ids[*source].clone(),
                target: ids[*target].clone(),
                kind: *kind,
            })
            .collect();
        Adg::new(nodes, edges)
    }
}

/// Build the analysis decision graph of `program`.
pub fn build_adg(program: &Program) -> Adg {
    let template = program.template();
    let augmented = Augmented::new(program);
    let merged = merge(&augmented);

    let is_decision = |key: Key| key.is_placeholder() || template.is_block_decision(key.name);
    let mut pruned = Pruned::new(&merged, is_decision);
    pruned.mark_branches();

    for constraint in program.constraints().iter() {
        if constraint.origin() == ConstraintOrigin::Link {
            continue;
        }
        let targets: Vec<usize> = match constraint.target() {
            ConstraintTarget::Block { node } => {
                let name = template.block(node).map_or(node, |block| block.name());
                pruned
                    .nodes_named(name)
                    .into_iter()
                    .filter(|i| !pruned.keys[*i].is_placeholder())
                    .collect()
            }
            ConstraintTarget::Option { variable, .. } => pruned
                .nodes_named(variable)
                .into_iter()
                .filter(|i| pruned.keys[*i].is_placeholder())
                .collect(),
        };
        for name in constraint.condition().referenced_names() {
            for source in pruned.nodes_named(name) {
                for target in &targets {
                    pruned.procedural(source, *target);
                }
            }
        }
    }

    let adg = pruned.into_adg();
    info!(
        nodes = adg.nodes().len(),
        edges = adg.edges().len(),
        procedural = adg.proc_edges().count();
        "ADG built"
    );
    adg
}

#[cfg(test)]
mod tests {
    use multiverse_parser::{ParseConfig, parse};

    use super::*;

    fn adg(template: &str, spec: Option<&str>) -> Adg {
        let program = parse(template, spec, ParseConfig::default()).expect("Failed to parse");
        build_adg(&program)
    }

    fn ids(adg: &Adg) -> Vec<&str> {
        adg.nodes().iter().map(|node| node.id.as_str()).collect()
    }

    fn edges(adg: &Adg) -> Vec<String> {
        adg.edges()
            .iter()
            .map(|edge| {
                let arrow = match edge.kind {
                    EdgeKind::Order => "->",
                    EdgeKind::Procedural => "=>",
                };
                format!("{}{arrow}{}", edge.source, edge.target)
            })
            .collect()
    }

    const BRANCHING: &str = "\
# --- (A) a1
x = {{cutoff=1,2,3}}
# --- (A) a2
x = 0
# --- (B)
y = {{m=\"ols\",\"glm\"}}
";

    #[test]
    fn test_alternatives_merge_and_branch() {
        let adg = adg(BRANCHING, None);
        assert_eq!(ids(&adg), vec!["A", "cutoff", "m"]);
        assert_eq!(edges(&adg), vec!["A=>cutoff", "A=>m", "cutoff->m"]);
    }

    #[test]
    fn test_shared_placeholder_in_alternatives() {
        let template = "\
# --- (A) a1
f({{k=1,2}})
# --- (A) a2
g({{k}})
";
        let adg = adg(template, None);
        assert_eq!(ids(&adg), vec!["A", "k"]);
        assert_eq!(edges(&adg), vec!["A->k"]);
    }

    #[test]
    fn test_reuse_in_unrelated_blocks() {
        let template = "\
# --- (A)
{{x=1,2}}
# --- (B)
{{x}}
";
        let adg = adg(template, None);
        assert_eq!(ids(&adg), vec!["x", "x-2"]);
        assert!(adg.nodes().iter().all(|node| node.name == Id::new("x")));
        assert_eq!(edges(&adg), vec!["x->x-2"]);
        assert_eq!(adg.decision_names(), vec![Id::new("x")]);
    }

    #[test]
    fn test_constraint_edges() {
        let template = "{{a=1,2}} {{b=3,4}}\n";
        let spec = r#"{"constraints": [
            {"variable": "a", "index": 0, "condition": "b == 3"},
            {"variable": "b", "index": 1, "condition": "a == 2"}
        ]}"#;
        let adg = adg(template, Some(spec));
        assert_eq!(edges(&adg), vec!["a=>b"]);

        let linked = self::adg(template, Some(r#"{"constraints": [{"link": ["a", "b"]}]}"#));
        assert_eq!(edges(&linked), vec!["a->b"]);
    }

    #[test]
    fn test_block_constraint_edge() {
        let template = "\
# --- (A) a1
# --- (A) a2
# --- (B)
{{m=1,2}}
# --- (C) c1
# --- (C) c2
";
        let spec = r#"{"graph": ["A->B", "A->C"], "constraints": [{"block": "C", "condition": "m == 1"}]}"#;
        let adg = adg(template, Some(spec));
        assert_eq!(ids(&adg), vec!["A", "C", "m"]);
        assert_eq!(edges(&adg), vec!["A=>m", "A=>C", "m=>C"]);
    }

    #[test]
    fn test_rebuild_is_identical() {
        let program = parse(BRANCHING, None, ParseConfig::default()).unwrap();
        assert_eq!(build_adg(&program), build_adg(&program));
    }
}
