//! Validated constraints and their lookup registry.

use indexmap::IndexMap;

use crate::{condition::Condition, identifier::Id};

/// Where a constraint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOrigin {
    /// Declared in the `constraints` section of the specification.
    Declared,
    /// An `@if` condition on a block marker.
    Marker,
    /// Generated from a `{link: [...]}` group.
    Link,
}

/// What a constraint restricts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintTarget {
    /// A block node. `node` is the block id, or `parameter:option` when the
    /// constraint names an option of a block-level decision.
    Block { node: Id },
    /// One option of a placeholder decision.
    Option { variable: Id, index: usize },
}

/// A single validated constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    target: ConstraintTarget,
    condition: Condition,
    skip: bool,
    origin: ConstraintOrigin,
}

impl Constraint {
    pub fn new(target: ConstraintTarget, condition: Condition, origin: ConstraintOrigin) -> Self {
        Self {
            target,
            condition,
            skip: false,
            origin,
        }
    }

    /// Make a block constraint skip the block when false instead of
    /// aborting the universe.
    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn target(&self) -> ConstraintTarget {
        self.target
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn skip(&self) -> bool {
        self.skip
    }

    pub fn origin(&self) -> ConstraintOrigin {
        self.origin
    }
}

/// All constraints of a program, grouped by target.
///
/// Several constraints may target the same block or option. They are kept in
/// registration order and all must hold.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    by_target: IndexMap<ConstraintTarget, Vec<Constraint>>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constraint.
    pub fn add(&mut self, constraint: Constraint) {
        self.by_target
            .entry(constraint.target())
            .or_default()
            .push(constraint);
    }

    /// Constraints on a block node, in registration order.
    pub fn for_block(&self, node: Id) -> &[Constraint] {
        self.by_target
            .get(&ConstraintTarget::Block { node })
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Constraints on one option of a placeholder decision.
    pub fn for_option(&self, variable: Id, index: usize) -> &[Constraint] {
        self.by_target
            .get(&ConstraintTarget::Option { variable, index })
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every constraint, grouped by target in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.by_target.values().flatten()
    }

    /// Number of constraints.
    pub fn len(&self) -> usize {
        self.by_target.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}
