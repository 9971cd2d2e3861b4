//! The fully parsed and validated input of the generator.

use indexmap::IndexMap;

use crate::{
    constraint::ConstraintSet, decision::Decision, graph::FlowGraph, identifier::Id,
    template::Template,
};

/// Everything the generator needs: blocks, decisions, constraints and the
/// expanded flow graph.
#[derive(Debug, Clone)]
pub struct Program {
    template: Template,
    decisions: IndexMap<Id, Decision>,
    constraints: ConstraintSet,
    graph: FlowGraph,
}

impl Program {
    pub fn new(
        template: Template,
        decisions: IndexMap<Id, Decision>,
        constraints: ConstraintSet,
        graph: FlowGraph,
    ) -> Self {
        Self {
            template,
            decisions,
            constraints,
            graph,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Placeholder decisions in declaration order.
    pub fn decisions(&self) -> &IndexMap<Id, Decision> {
        &self.decisions
    }

    pub fn decision(&self, var: Id) -> Option<&Decision> {
        self.decisions.get(&var)
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Flow graph with block-level decisions expanded into option nodes.
    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }
}
