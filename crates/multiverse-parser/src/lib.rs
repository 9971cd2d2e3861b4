//! # Multiverse Parser
//!
//! Reads a multiverse template and its specification into a validated
//! [`Program`].
//!
//! ## Usage
//!
//! ```
//! # use multiverse_parser::{parse, ParseConfig, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let template = "\
//! # --- (A) ols
//! fit = ols(y ~ x, cutoff={{cutoff=2,3}})
//! # --- (A) glm
//! fit = glm(y ~ x)
//! # --- (B)
//! print(fit)
//! ";
//!     let program = parse(template, None, ParseConfig::default())?;
//!     assert_eq!(program.graph().node_count(), 3);
//!     Ok(())
//! }
//! ```

mod condition;
mod constraint;
mod decision;
pub mod error;
mod graph;
mod marker;
mod placeholder;
mod sample;
mod span;
mod spec;
mod template;

pub use error::ParseError;
pub use span::Span;

use log::{debug, info};

use multiverse_core::program::Program;

use crate::{
    decision::DecisionRegistry,
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
    graph::BuiltGraph,
    spec::SpecSource,
    template::ParsedTemplate,
};

/// Configuration for parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseConfig {
    /// Seed for sampled option lists that do not give their own.
    pub default_seed: u64,
}

impl ParseConfig {
    pub fn new(default_seed: u64) -> Self {
        Self { default_seed }
    }
}

/// A decision may not share its name with a block or a graph node.
fn check_collisions(
    decisions: &DecisionRegistry,
    parsed: &ParsedTemplate<'_>,
    built: &BuiltGraph,
    collector: &mut DiagnosticCollector,
) {
    for name in decisions.names() {
        let is_block = parsed.template.has_name(name);
        if !is_block && !built.names.contains(&name) {
            continue;
        }
        let kind = if is_block { "block" } else { "graph node" };
        let mut diag = Diagnostic::error(format!(
            "decision `{name}` has the same name as a {kind}"
        ))
        .with_code(ErrorCode::E202)
        .with_help("conditions could not tell them apart; rename one of them");
        if let Some(span) = decisions.inline_span(name) {
            diag = diag.with_label(span, "decision defined here");
        }
        if let Some(span) = parsed.block_spans.get(&name) {
            diag = diag.with_secondary_label(*span, "block declared here");
        }
        collector.emit(diag);
    }
}

/// Parse a template into a [`Program`].
///
/// The pipeline:
///
/// 1. **Split** - Lift the configuration block out of the template
/// 2. **Specification** - Deserialize the JSON document
/// 3. **Decisions** - Register declared decisions
/// 4. **Blocks** - Cut the template into blocks and chunks
/// 5. **Constraints** - Validate constraints and expand links
/// 6. **Graph** - Build and expand the flow graph
///
/// # Arguments
///
/// * `template` - The template text
/// * `spec` - An out-of-band specification document; it may not be combined
///   with a configuration block in the template
/// * `config` - Parse settings
///
/// # Returns
///
/// The validated program, or a [`ParseError`] carrying every problem found.
/// Warnings are logged and do not fail parsing.
pub fn parse(template: &str, spec: Option<&str>, config: ParseConfig) -> Result<Program, ParseError> {
    info!(bytes = template.len(); "Parsing template");

    // Step 1: Split
    let split = template::split_config(template)?;

    // Step 2: Specification
    let source = match (&split.config, spec) {
        (Some(block), Some(_)) => {
            return Err(Diagnostic::error("specification supplied twice")
                .with_code(ErrorCode::E203)
                .with_label(block.span, "configuration block in the template")
                .with_help("remove the configuration block or the separate specification")
                .into());
        }
        (Some(block), None) => SpecSource {
            text: &block.text,
            offset: Some(block.offset),
        },
        (None, Some(text)) => SpecSource { text, offset: None },
        (None, None) => SpecSource {
            text: "",
            offset: None,
        },
    };
    let raw = spec::parse_spec(source)?;
    debug!(
        decisions = raw.decisions.len(),
        graph_entries = raw.graph.len(),
        constraints = raw.constraints.len();
        "Specification read"
    );

    let mut collector = DiagnosticCollector::new();

    // Step 3: Decisions
    let mut decisions =
        DecisionRegistry::from_spec(raw.decisions, config.default_seed, &mut collector);

    // Step 4: Blocks
    let parsed = template::build_template(&split.lines, &mut decisions, &mut collector);
    debug!(blocks = parsed.template.blocks().count(); "Template read");

    // Step 5: Constraints
    let constraints = constraint::build_constraints(
        raw.constraints,
        &parsed.conditions,
        &parsed.template,
        &decisions,
        &mut collector,
    );

    // Step 6: Graph
    let built = graph::build_graph(&raw.graph, &parsed.template, &mut collector);
    check_collisions(&decisions, &parsed, &built, &mut collector);

    collector.finish()?;
    info!(
        blocks = parsed.template.blocks().count(),
        nodes = built.graph.node_count(),
        constraints = constraints.len();
        "Parsed template successfully"
    );

    Ok(Program::new(
        parsed.template,
        decisions.into_decisions(),
        constraints,
        built.graph,
    ))
}
