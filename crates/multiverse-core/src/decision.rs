//! Placeholder decisions.

use serde::Serialize;

use crate::{identifier::Id, value::OptionValue};

/// A named, finite set of interchangeable option values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    var: Id,
    options: Vec<OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    desc: Option<String>,
}

impl Decision {
    /// Create a decision. `options` must not be empty.
    pub fn new(var: Id, options: Vec<OptionValue>) -> Self {
        debug_assert!(!options.is_empty(), "a decision needs at least one option");
        Self {
            var,
            options,
            desc: None,
        }
    }

    /// Attach a human-readable description.
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = Some(desc.into());
        self
    }

    /// Decision name.
    pub fn var(&self) -> Id {
        self.var
    }

    /// Options in declaration order.
    pub fn options(&self) -> &[OptionValue] {
        &self.options
    }

    /// Option at `index`.
    pub fn option(&self, index: usize) -> Option<&OptionValue> {
        self.options.get(index)
    }

    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Always false for a well-formed decision.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Description, if the author gave one.
    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    /// Index of the option whose rendered text is `text`.
    pub fn position_of(&self, text: &str) -> Option<usize> {
        self.options
            .iter()
            .position(|option| option.to_string() == text)
    }
}
