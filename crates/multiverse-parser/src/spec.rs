//! The JSON specification document.
//!
//! ```json
//! {
//!   "decisions": [{"var": "cutoff", "options": [2, 2.5, 3], "desc": "outliers"}],
//!   "graph": ["A->B->C", "A->C"],
//!   "constraints": [{"block": "C", "condition": "cutoff == 2"}, {"link": ["a", "b"]}]
//! }
//! ```
//!
//! The document is only deserialized here; each section is validated by its
//! own registry. Fields this crate does not know about are ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
};

/// Where the specification text came from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpecSource<'a> {
    pub text: &'a str,
    /// Offset of `text` in the template when it was read from the
    /// configuration block; `None` for an out-of-band specification.
    pub offset: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawSpec {
    #[serde(default)]
    pub decisions: Vec<RawDecision>,
    #[serde(default)]
    pub graph: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<RawConstraint>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDecision {
    pub var: String,
    /// A literal option list or a sampling descriptor.
    pub options: Value,
    #[serde(default)]
    pub desc: Option<String>,
}

/// A constraint entry before validation. Which fields may be combined is
/// checked by the constraint registry.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConstraint {
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub option: Option<Value>,
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default, alias = "skippable")]
    pub skip: Option<bool>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub link: Option<Vec<String>>,
}

/// Byte offset of a 1-based line/column position in `text`.
fn offset_of(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

/// Deserialize the specification document.
pub(crate) fn parse_spec(source: SpecSource<'_>) -> Result<RawSpec> {
    if source.text.trim().is_empty() {
        return Ok(RawSpec::default());
    }
    serde_json::from_str(source.text).map_err(|err| {
        let at = offset_of(source.text, err.line(), err.column());
        let diag = Diagnostic::error(format!("invalid specification: {err}"))
            .with_code(ErrorCode::E005)
            .with_label(
                Span::new(at..(at + 1).min(source.text.len())),
                ErrorCode::E005.description(),
            )
            .with_help("the specification is a JSON object with `decisions`, `graph` and `constraints`");
        diag.relocate(source.offset)
    })
}
