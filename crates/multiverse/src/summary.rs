//! Per-universe summaries and the multiverse overview.

use indexmap::IndexMap;
use serde::Serialize;

use multiverse_core::{
    adg::Adg, history::Universe, identifier::Id, program::Program, value::OptionValue,
};

use crate::analyze::Path;

/// What distinguishes one universe from the others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Block names along the path, skipped nodes removed.
    path: Vec<Id>,
    /// Placeholder bindings in declaration order, then the block-level
    /// choices along the path.
    decisions: IndexMap<Id, OptionValue>,
}

impl Summary {
    /// Summarize `universe`, generated from `program` along one of `paths`.
    pub fn new(program: &Program, paths: &[Path], universe: &Universe) -> Self {
        let template = program.template();
        let history = universe.history();
        let visited: Vec<Id> = paths
            .get(history.path())
            .map(|path| {
                path.iter()
                    .copied()
                    .filter(|node| !history.is_skipped(*node))
                    .collect()
            })
            .unwrap_or_default();

        let mut decisions = IndexMap::new();
        for var in program.decisions().keys() {
            if let Some(binding) = history.binding(*var) {
                decisions.insert(*var, binding.option.clone());
            }
        }

        let mut path = Vec::with_capacity(visited.len());
        for node in visited {
            let Some(block) = template.block(node) else {
                path.push(node);
                continue;
            };
            path.push(block.name());
            if let (Some(parameter), Some(option)) = (block.parameter(), block.option()) {
                decisions.insert(parameter, OptionValue::from(option.to_string().as_str()));
            }
        }

        Self { path, decisions }
    }

    pub fn path(&self) -> &[Id] {
        &self.path
    }

    pub fn decisions(&self) -> &IndexMap<Id, OptionValue> {
        &self.decisions
    }
}

/// A decision exercised by the ADG with its options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionOptions {
    pub var: Id,
    pub options: Vec<OptionValue>,
}

/// The ADG together with the options of the decisions it shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    #[serde(flatten)]
    adg: Adg,
    decisions: Vec<DecisionOptions>,
}

impl Overview {
    pub fn new(program: &Program, adg: Adg) -> Self {
        let block_decisions = program.template().block_decisions();
        let decisions = adg
            .decision_names()
            .into_iter()
            .map(|var| {
                let options = match program.decision(var) {
                    Some(decision) => decision.options().to_vec(),
                    None => block_decisions
                        .get(&var)
                        .into_iter()
                        .flatten()
                        .filter_map(|node| program.template().block(*node)?.option())
                        .map(|option| OptionValue::from(option.to_string().as_str()))
                        .collect(),
                };
                DecisionOptions { var, options }
            })
            .collect();
        Self { adg, decisions }
    }

    pub fn adg(&self) -> &Adg {
        &self.adg
    }

    pub fn decisions(&self) -> &[DecisionOptions] {
        &self.decisions
    }
}
