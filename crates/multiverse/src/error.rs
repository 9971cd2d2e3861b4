//! Error types for multiverse operations.
//!
//! This module provides the main error type [`MultiverseError`] which wraps
//! the error conditions that can occur while compiling a template.

use std::io;

use thiserror::Error;

use multiverse_parser::error::{Diagnostic, ParseError};

/// The main error type for multiverse operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the template alongside the diagnostics so
/// labels can be rendered against it.
#[derive(Debug, Error)]
pub enum MultiverseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Graph error: {0}")]
    Graph(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MultiverseError {
    /// Create a new `Parse` error with the associated template.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}

impl From<Diagnostic> for MultiverseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::Graph(diagnostic.to_string())
    }
}
