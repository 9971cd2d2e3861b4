//! Blocks and chunks of a parsed template.
//!
//! A template is cut into [`Block`]s at marker lines. Each block is a list of
//! [`Chunk`]s: literal code that ends either in a placeholder decision or at
//! the block boundary.

use indexmap::IndexMap;
use serde::Serialize;

use crate::identifier::Id;

/// Id of the anonymous block holding the code before the first marker.
pub const START_BLOCK: &str = "_start";

/// A piece of literal code, optionally followed by a placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    variable: Option<Id>,
    code: String,
}

impl Chunk {
    /// Create a chunk ending in the placeholder `variable`.
    pub fn with_variable(variable: Id, code: impl Into<String>) -> Self {
        Self {
            variable: Some(variable),
            code: code.into(),
        }
    }

    /// Create a chunk ending at the block boundary.
    pub fn plain(code: impl Into<String>) -> Self {
        Self {
            variable: None,
            code: code.into(),
        }
    }

    /// The placeholder decision this chunk ends in, if any.
    pub fn variable(&self) -> Option<Id> {
        self.variable
    }

    /// The literal code preceding the placeholder or block boundary.
    pub fn code(&self) -> &str {
        &self.code
    }
}

/// A labeled segment of the template.
///
/// Blocks that are alternatives of a block-level decision carry the
/// decision name in `parameter` and their own name in `option`; their id is
/// `parameter:option`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    id: Id,
    parameter: Option<Id>,
    option: Option<Id>,
    chunks: Vec<Chunk>,
}

impl Block {
    /// Create an ordinary block.
    pub fn new(id: Id, chunks: Vec<Chunk>) -> Self {
        Self {
            id,
            parameter: None,
            option: None,
            chunks,
        }
    }

    /// Create a block that is one option of the block-level decision `parameter`.
    pub fn new_option(parameter: Id, option: Id, chunks: Vec<Chunk>) -> Self {
        Self {
            id: parameter.with_option(option),
            parameter: Some(parameter),
            option: Some(option),
            chunks,
        }
    }

    /// Unique node id of the block.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Block-level decision this block is an option of.
    pub fn parameter(&self) -> Option<Id> {
        self.parameter
    }

    /// Option name, when the block is a decision alternative.
    pub fn option(&self) -> Option<Id> {
        self.option
    }

    /// Name of the block ignoring options: the parameter for alternatives,
    /// the id otherwise.
    pub fn name(&self) -> Id {
        self.parameter.unwrap_or(self.id)
    }

    /// Chunks of the block in template order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Placeholder decisions referenced by the block, in first-use order.
    pub fn variables(&self) -> Vec<Id> {
        let mut seen = Vec::new();
        for variable in self.chunks.iter().filter_map(Chunk::variable) {
            if !seen.contains(&variable) {
                seen.push(variable);
            }
        }
        seen
    }

    /// True when the block contributes neither code nor placeholders.
    pub fn is_empty(&self) -> bool {
        self.chunks
            .iter()
            .all(|chunk| chunk.variable.is_none() && chunk.code.is_empty())
    }
}

/// The parsed template: blocks keyed by node id plus block names in
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct Template {
    blocks: IndexMap<Id, Block>,
    order: Vec<Id>,
}

impl Template {
    /// Create an empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a block, returning the existing block when the id is taken.
    pub fn insert(&mut self, block: Block) -> Result<(), Block> {
        if self.blocks.contains_key(&block.id()) {
            return Err(block);
        }
        let name = block.name();
        if !self.order.contains(&name) {
            self.order.push(name);
        }
        self.blocks.insert(block.id(), block);
        Ok(())
    }

    /// Block by node id.
    pub fn block(&self, id: Id) -> Option<&Block> {
        self.blocks.get(&id)
    }

    /// All blocks in template order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Block names (ignoring options) in declaration order.
    pub fn order(&self) -> &[Id] {
        &self.order
    }

    /// Whether a block name (ignoring options) is declared.
    pub fn has_name(&self, name: Id) -> bool {
        self.order.contains(&name)
    }

    /// The anchor block holding code before the first marker, if any.
    pub fn start_block(&self) -> Option<&Block> {
        self.blocks.get(&Id::new(START_BLOCK))
    }

    /// Block-level decisions: each parameter with the node ids of its options,
    /// in declaration order.
    pub fn block_decisions(&self) -> IndexMap<Id, Vec<Id>> {
        let mut decisions: IndexMap<Id, Vec<Id>> = IndexMap::new();
        for block in self.blocks.values() {
            if let Some(parameter) = block.parameter() {
                decisions.entry(parameter).or_default().push(block.id());
            }
        }
        decisions
    }

    /// Whether `name` is a block-level decision.
    pub fn is_block_decision(&self, name: Id) -> bool {
        self.blocks
            .values()
            .any(|block| block.parameter() == Some(name))
    }
}
