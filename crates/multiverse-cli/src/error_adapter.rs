//! Rendering of [`MultiverseError`] through miette.
//!
//! A parse error expands into one [`Report`] per diagnostic, warnings
//! included, each pointing into the template. Every other error is a single
//! report without source.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, Severity as MietteSeverity, SourceSpan};

use multiverse::MultiverseError;
use multiverse_parser::error::{Diagnostic, Severity};

/// One renderable problem.
#[derive(Debug)]
pub enum Report<'a> {
    /// A template or specification diagnostic, with the template it
    /// points into.
    Template { diag: &'a Diagnostic, src: &'a str },
    /// An error raised after parsing, or while loading inputs.
    Pipeline(&'a MultiverseError),
}

/// Split `err` into the reports to render, in emission order.
pub fn reports(err: &MultiverseError) -> Vec<Report<'_>> {
    match err {
        MultiverseError::Parse { err, src } => err
            .diagnostics()
            .iter()
            .map(|diag| Report::Template { diag, src })
            .collect(),
        _ => vec![Report::Pipeline(err)],
    }
}

/// Advice for a flow graph error, keyed on the code in its message.
fn graph_help(message: &str) -> &'static str {
    if message.contains("E302") {
        "every path needs an entry node: a node without incoming edges"
    } else if message.contains("E303") {
        "every path needs an exit node: a node without outgoing edges"
    } else if message.contains("E304") {
        "remove one edge of the cycle from the `graph` entries"
    } else {
        "check the `graph` entries of the specification"
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Template { diag, .. } => f.write_str(diag.message()),
            Report::Pipeline(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for Report<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Report::Template { .. } => None,
            Report::Pipeline(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for Report<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self {
            Report::Template { diag, .. } => {
                return diag.code().map(|c| Box::new(c) as Box<dyn fmt::Display>);
            }
            Report::Pipeline(MultiverseError::Io(_)) => "multiverse::io",
            Report::Pipeline(MultiverseError::Graph(_)) => "multiverse::graph",
            Report::Pipeline(MultiverseError::Config(_)) => "multiverse::config",
            Report::Pipeline(MultiverseError::Parse { .. }) => return None,
        };
        Some(Box::new(code))
    }

    fn severity(&self) -> Option<MietteSeverity> {
        match self {
            Report::Template { diag, .. } if diag.severity() == Severity::Warning => {
                Some(MietteSeverity::Warning)
            }
            _ => Some(MietteSeverity::Error),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Report::Template { diag, .. } => {
                diag.help().map(|h| Box::new(h) as Box<dyn fmt::Display>)
            }
            Report::Pipeline(MultiverseError::Graph(message)) => {
                Some(Box::new(graph_help(message)))
            }
            Report::Pipeline(MultiverseError::Config(_)) => Some(Box::new(
                "pass `--config` or edit `multiverse/config.toml` in the config directory",
            )),
            Report::Pipeline(_) => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Report::Template { src, .. } => Some(src as &dyn miette::SourceCode),
            Report::Pipeline(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Report::Template { diag, .. } = self else {
            return None;
        };
        if diag.labels().is_empty() {
            return None;
        }
        Some(Box::new(diag.labels().iter().map(|label| {
            let span = SourceSpan::new(label.span().start().into(), label.span().len());
            let text = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(text, span)
            } else {
                LabeledSpan::new_with_span(text, span)
            }
        })))
    }
}
