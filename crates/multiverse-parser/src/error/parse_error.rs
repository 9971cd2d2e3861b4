//! Every problem found while parsing one template.

use std::fmt;

use crate::error::Diagnostic;

/// Result of a single reading step that stops at its first problem.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// The diagnostics of a rejected template, warnings included, in the order
/// they were found.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub(crate) fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The diagnostics that rejected the template.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity().is_error())
    }
}

/// Headed by the first error; the rest are counted.
impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.errors().next().or(self.diagnostics.first()) else {
            return f.write_str("template rejected");
        };
        write!(f, "{first}")?;

        let errors = self.errors().count().saturating_sub(1);
        let warnings = self.diagnostics.len() - self.errors().count();
        match (errors, warnings) {
            (0, 0) => Ok(()),
            (e, 0) => write!(f, " (+{e} more)"),
            (0, w) => write!(f, " ({w} warning(s))"),
            (e, w) => write!(f, " (+{e} more, {w} warning(s))"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diag: Diagnostic) -> Self {
        Self::new(vec![diag])
    }
}
