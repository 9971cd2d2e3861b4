//! Per-universe record of the choices that produced it.

use serde::Serialize;

use crate::{identifier::Id, value::OptionValue};

/// One decision bound to one of its options.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub decision: Id,
    pub option: OptionValue,
    pub index: usize,
}

/// Choices made while generating one universe.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct History {
    path: usize,
    bindings: Vec<Binding>,
    skipped: Vec<Id>,
}

impl History {
    /// Start an empty history for the path at `path`.
    pub fn new(path: usize) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Index of the enumerated path this universe follows.
    pub fn path(&self) -> usize {
        self.path
    }

    /// Placeholder bindings in the order they were made.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Nodes whose code was omitted by a skipping constraint.
    pub fn skipped(&self) -> &[Id] {
        &self.skipped
    }

    /// The binding of `decision`, if it has been made.
    pub fn binding(&self, decision: Id) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.decision == decision)
    }

    pub fn is_skipped(&self, node: Id) -> bool {
        self.skipped.contains(&node)
    }

    /// Record a binding. Callers bind each decision at most once.
    pub fn bind(&mut self, decision: Id, option: OptionValue, index: usize) {
        debug_assert!(self.binding(decision).is_none(), "decision bound twice");
        self.bindings.push(Binding {
            decision,
            option,
            index,
        });
    }

    pub fn skip(&mut self, node: Id) {
        self.skipped.push(node);
    }
}

/// A fully generated program variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Universe {
    text: String,
    history: History,
}

impl Universe {
    pub fn new(text: String, history: History) -> Self {
        Self { text, history }
    }

    /// The generated program text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}
