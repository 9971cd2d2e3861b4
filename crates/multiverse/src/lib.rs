//! Multiverse - Generate every variant of an analysis from one template.
//!
//! A template holds labeled alternative code blocks and inline placeholder
//! decisions. This crate parses it, enumerates the admissible paths through
//! its flow graph, expands every decision along every path into concrete
//! universes, and summarizes the decisions in an analysis decision graph.

pub mod config;

mod adg;
mod analyze;
mod error;
mod generate;
mod summary;

pub use multiverse_core::{
    condition, constraint, decision, graph, history, identifier, program, template, value,
};
pub use multiverse_core::adg::{Adg, AdgEdge, AdgNode, EdgeKind};

pub use analyze::Path;
pub use error::MultiverseError;
pub use summary::{DecisionOptions, Overview, Summary};

use log::{debug, info, trace};

use multiverse_core::{history::Universe, program::Program};
use multiverse_parser::ParseConfig;

use config::AppConfig;

/// Builder for compiling multiverse templates.
///
/// This provides an API for processing a template through parsing, path
/// enumeration, generation and summarization.
///
/// # Examples
///
/// ```rust,no_run
/// use multiverse::{MultiverseBuilder, config::AppConfig};
///
/// let template = "x = {{cutoff=2,2.5,3}}\n";
///
/// let builder = MultiverseBuilder::new(AppConfig::default());
///
/// // Parse the template and its flow graph
/// let program = builder.parse(template, None)
///     .expect("Failed to parse");
/// let paths = builder.paths(&program)
///     .expect("Invalid flow graph");
///
/// // Expand every decision
/// let universes = builder.generate(&program, &paths);
/// assert_eq!(universes.len(), 3);
///
/// // Or use default config
/// let builder = MultiverseBuilder::default();
/// ```
#[derive(Default)]
pub struct MultiverseBuilder {
    config: AppConfig,
}

impl MultiverseBuilder {
    /// Create a new builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including generation limits
    ///   and the default sampling seed
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a template into a validated program.
    ///
    /// # Arguments
    ///
    /// * `template` - Template text
    /// * `spec` - Specification document, when it is not embedded in the
    ///   template
    ///
    /// # Errors
    ///
    /// Returns `MultiverseError::Parse` carrying every diagnostic found.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use multiverse::MultiverseBuilder;
    ///
    /// let spec = r#"{"decisions": [{"var": "model", "options": ["ols", "glm"]}]}"#;
    /// let program = MultiverseBuilder::default()
    ///     .parse("fit = {{model}}(y ~ x)\n", Some(spec))
    ///     .expect("Failed to parse template");
    /// ```
    pub fn parse(&self, template: &str, spec: Option<&str>) -> Result<Program, MultiverseError> {
        info!("Parsing template");

        let parse_config = ParseConfig::new(self.config.generation().seed());
        let program = multiverse_parser::parse(template, spec, parse_config)
            .map_err(|err| MultiverseError::new_parse_error(err, template))?;

        debug!("Template parsed successfully");
        trace!(program:?; "Parsed program");

        Ok(program)
    }

    /// Validate the flow graph and enumerate its source-to-sink paths.
    ///
    /// # Errors
    ///
    /// Returns `MultiverseError::Graph` when the graph has no source, no sink
    /// or a reachable cycle.
    pub fn paths(&self, program: &Program) -> Result<Vec<Path>, MultiverseError> {
        Ok(analyze::paths(program)?)
    }

    /// Estimated number of universes: the product of all decision option
    /// counts times the number of paths.
    pub fn cardinality(&self, program: &Program, paths: &[Path]) -> u64 {
        generate::cardinality(program, paths)
    }

    /// Whether `estimate` is above the configured universe limit.
    pub fn exceeds_limit(&self, estimate: u64) -> bool {
        estimate > self.config.generation().max_universes()
    }

    /// Generate every universe along `paths`.
    pub fn generate(&self, program: &Program, paths: &[Path]) -> Vec<Universe> {
        generate::generate(program, paths)
    }

    /// Summarize each universe by its path and decisions.
    pub fn summarize(
        &self,
        program: &Program,
        paths: &[Path],
        universes: &[Universe],
    ) -> Vec<Summary> {
        universes
            .iter()
            .map(|universe| Summary::new(program, paths, universe))
            .collect()
    }

    /// Build the analysis decision graph.
    pub fn build_adg(&self, program: &Program) -> Adg {
        adg::build_adg(program)
    }

    /// The analysis decision graph with the options of its decisions.
    pub fn overview(&self, program: &Program) -> Overview {
        Overview::new(program, self.build_adg(program))
    }
}
