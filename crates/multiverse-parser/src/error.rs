//! Diagnostics for templates and specifications.
//!
//! Each reading phase reports into a [`DiagnosticCollector`] so one run
//! surfaces every problem it can. Warnings are logged as they are found;
//! any error turns the collected [`Diagnostic`]s into a [`ParseError`].
//! Codes are grouped by kind: `E0xx` syntax, `E1xx` references, `E2xx`
//! duplicates, `E3xx` flow graph, `E4xx` constraints and `E5xx` sampling.

mod collector;
mod diagnostic;
mod error_code;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;
pub(crate) use parse_error::Result;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use parse_error::ParseError;
