//! A single problem found in a template or its specification.
//!
//! Labels point into the template. Problems found in an out-of-band
//! specification carry none, since their offsets would be meaningless
//! against the template.
//!
//! ```text
//! error[E100]: decision `cutoff` is not declared
//!    |
//! 14 |     df = df[abs(df.y - median) <= {{cutoff}} * iqr]
//!    |                                   ^^^^^^^^^^ undefined decision
//!    |
//!    = help: declare it in the specification or inline as `{{cutoff=1,2}}`
//! ```

use std::fmt;

use crate::{error::ErrorCode, span::Span};

/// Whether a problem stops the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// No program is produced.
    Error,
    /// Logged; the program is still produced.
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        *self == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// A message attached to a span of the template.
///
/// The primary label marks the offending text; secondary ones point at
/// related declarations, such as the first definition of a duplicate block.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    primary: bool,
}

impl Label {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// A problem that rejects the template.
    ///
    /// ```
    /// # use multiverse_parser::error::{Diagnostic, ErrorCode};
    /// # use multiverse_parser::Span;
    /// let diag = Diagnostic::error("decision `a` is not declared")
    ///     .with_code(ErrorCode::E100)
    ///     .with_label(Span::new(4..9), "undefined decision")
    ///     .with_help("declare `a` in the specification");
    /// assert_eq!(diag.to_string(), "error[E100]: decision `a` is not declared");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// A suspicious construct that does not stop the parse.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Labels in the order they were attached; the primary one first.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message, true)
    }

    pub fn with_secondary_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message, false)
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn labelled(mut self, span: Span, message: impl Into<String>, primary: bool) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
            primary,
        });
        self
    }

    /// Re-anchor labels computed against a slice of the template.
    ///
    /// With `Some(offset)` every label moves by `offset` bytes. With `None`
    /// the text did not come from the template and labels are dropped.
    pub(crate) fn relocate(mut self, offset: Option<usize>) -> Self {
        match offset {
            Some(offset) => {
                for label in &mut self.labels {
                    label.span = label.span.shift(offset);
                }
            }
            None => self.labels.clear(),
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}
