//! Command-line argument definitions for the multiverse CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the template and specification, the
//! output directory, configuration and logging, and how an oversized
//! multiverse is confirmed.

use clap::Parser;

/// Command-line arguments for the multiverse generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the annotated template
    #[arg(help = "Path to the template file")]
    pub template: String,

    /// Path to a JSON specification, for templates without a configuration block
    #[arg(short, long)]
    pub spec: Option<String>,

    /// Output directory, overriding the configured one
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Generate without asking when the universe limit is exceeded
    #[arg(short, long, conflicts_with = "non_interactive")]
    pub yes: bool,

    /// Never ask; stop without output when the universe limit is exceeded
    #[arg(long)]
    pub non_interactive: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
