//! Graph analysis: validation and path enumeration.
//!
//! The expanded flow graph must have at least one source and one sink, and
//! must be acyclic. Every simple source-to-sink path is then enumerated
//! depth first, following edges in insertion order so the numbering of
//! paths is stable.

use std::collections::HashMap;

use indexmap::IndexSet;
use log::{debug, info};
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};

use multiverse_core::{
    graph::FlowGraph,
    identifier::Id,
    program::Program,
    template::START_BLOCK,
};
use multiverse_parser::error::{Diagnostic, ErrorCode};

/// A source-to-sink sequence of node ids.
pub type Path = Vec<Id>;

/// Petgraph view of a [`FlowGraph`].
struct Analysis {
    graph: DiGraph<Id, ()>,
}

impl Analysis {
    fn new(flow: &FlowGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut node_id_map: HashMap<Id, NodeIndex> = HashMap::new();
        for node in flow.nodes() {
            node_id_map.insert(node, graph.add_node(node));
        }
        for (source, target) in flow.edges() {
            graph.add_edge(node_id_map[&source], node_id_map[&target], ());
        }
        Self { graph }
    }

    /// Nodes of the first cycle, in graph order.
    fn cycle(&self) -> Option<Vec<Id>> {
        let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || self.graph.contains_edge(component[0], component[0])
            })
            .map(|mut component| {
                component.sort();
                component
            })
            .collect();
        cycles.sort();
        cycles
            .first()
            .map(|nodes| nodes.iter().map(|index| self.graph[*index]).collect())
    }
}

fn graph_error(code: ErrorCode, message: String) -> Diagnostic {
    Diagnostic::error(message).with_code(code)
}

/// Check the graph and enumerate its paths.
///
/// An empty graph has no paths.
///
/// # Errors
///
/// Returns a diagnostic with code `E302` when there is no source, `E303`
/// when there is no sink and `E304` when the graph has a cycle anywhere.
pub fn analyze(flow: &FlowGraph) -> Result<Vec<Path>, Diagnostic> {
    if flow.node_count() == 0 {
        debug!("Flow graph is empty");
        return Ok(Vec::new());
    }

    let sources = flow.sources();
    if sources.is_empty() {
        return Err(graph_error(
            ErrorCode::E302,
            "flow graph has no source node".to_string(),
        ));
    }
    if flow.sinks().is_empty() {
        return Err(graph_error(
            ErrorCode::E303,
            "flow graph has no sink node".to_string(),
        ));
    }

    if let Some(cycle) = Analysis::new(flow).cycle() {
        let names: Vec<String> = cycle.iter().map(Id::to_string).collect();
        return Err(graph_error(
            ErrorCode::E304,
            format!("flow graph contains a cycle through {}", names.join(", ")),
        ));
    }

    let mut paths = Vec::new();
    for source in sources {
        let mut visited = IndexSet::new();
        walk(flow, source, &mut visited, &mut paths);
    }
    info!(paths = paths.len(); "Paths enumerated");
    Ok(paths)
}

/// Enumerate the paths of `program`.
///
/// Leading code that the flow graph does not mention is prepended to every
/// path, and forms the only path when the graph is empty.
///
/// # Errors
///
/// See [`analyze`].
pub fn paths(program: &Program) -> Result<Vec<Path>, Diagnostic> {
    let mut paths = analyze(program.graph())?;

    let anchor = Id::new(START_BLOCK);
    if program.template().start_block().is_some() && !program.graph().contains(anchor) {
        if paths.is_empty() {
            paths.push(vec![anchor]);
        } else {
            for path in &mut paths {
                path.insert(0, anchor);
            }
        }
    }
    Ok(paths)
}

fn walk(flow: &FlowGraph, node: Id, visited: &mut IndexSet<Id>, paths: &mut Vec<Path>) {
    visited.insert(node);
    let children = flow.children(node);
    if children.is_empty() {
        paths.push(visited.iter().copied().collect());
    } else {
        for child in children {
            if !visited.contains(child) {
                walk(flow, *child, visited, paths);
            }
        }
    }
    visited.pop();
}
