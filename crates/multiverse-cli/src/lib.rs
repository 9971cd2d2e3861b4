//! CLI logic for the multiverse generator.
//!
//! This module contains the core CLI logic: it reads a template, generates
//! its universes and writes them with their summaries.

pub mod error_adapter;

mod args;
mod config;
mod output;

pub use args::Args;
pub use output::OutputWriter;

use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
};

use log::{info, warn};

use multiverse::{MultiverseBuilder, MultiverseError};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The multiverse was written.
    Generated { universes: usize },
    /// Generation was declined at the size check; nothing was written.
    Cancelled { estimate: u64 },
}

/// Run the multiverse CLI application
///
/// This function processes the template through the multiverse pipeline
/// and writes the universes, `summary.json` and `overview.json` to the
/// output directory.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `MultiverseError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Flow graph errors
pub fn run(args: &Args) -> Result<Outcome, MultiverseError> {
    let stdin = io::stdin();
    run_with_prompt(args, &mut stdin.lock(), &mut io::stderr())
}

/// Run with an explicit prompt channel for the size confirmation.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_prompt(
    args: &Args,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<Outcome, MultiverseError> {
    info!(
        template_path = args.template,
        spec_path:? = args.spec;
        "Processing template"
    );

    // Load configuration
    let app_config = config::load_config(args.config.as_ref())?;
    let directory = args
        .output
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| app_config.output().directory().to_path_buf());

    // Read input files
    let template = fs::read_to_string(&args.template)?;
    let spec = args.spec.as_ref().map(fs::read_to_string).transpose()?;

    // Compile using the MultiverseBuilder API
    let builder = MultiverseBuilder::new(app_config);
    let program = builder.parse(&template, spec.as_deref())?;
    let paths = builder.paths(&program)?;

    let estimate = builder.cardinality(&program, &paths);
    let limit = builder.config().generation().max_universes();
    if builder.exceeds_limit(estimate) {
        warn!(estimate, limit; "Universe estimate exceeds the limit");
        let proceed = if args.yes {
            true
        } else if args.non_interactive {
            false
        } else {
            confirm(estimate, limit, input, prompt)?
        };
        if !proceed {
            info!(estimate; "Generation cancelled");
            return Ok(Outcome::Cancelled { estimate });
        }
    }

    let universes = builder.generate(&program, &paths);
    let summaries = builder.summarize(&program, &paths, &universes);
    let overview = builder.overview(&program);

    // Write output files
    let writer = OutputWriter::new(directory, &args.template);
    writer.write(&universes, &summaries, &overview)?;

    info!(universes = universes.len(); "Multiverse generated successfully");

    Ok(Outcome::Generated {
        universes: universes.len(),
    })
}

/// Ask whether to generate an oversized multiverse. Anything but a `y` or
/// `yes` answer declines.
fn confirm(
    estimate: u64,
    limit: u64,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> io::Result<bool> {
    write!(
        prompt,
        "Up to {estimate} universes would be generated (limit {limit}). Continue? [y/N] "
    )?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_answers() {
        for (answer, expected) in [("y\n", true), ("YES\n", true), ("n\n", false), ("", false)] {
            let mut prompt = Vec::new();
            let accepted = confirm(2048, 1024, &mut answer.as_bytes(), &mut prompt).unwrap();
            assert_eq!(accepted, expected, "{answer:?}");
            assert!(String::from_utf8(prompt).unwrap().contains("2048"));
        }
    }
}
