//! Configuration types for multiverse generation.
//!
//! All types implement [`serde::Deserialize`] so the CLI can load them from
//! a TOML file. Missing sections and fields fall back to their defaults.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining generation and output settings.
//! - [`GenerationConfig`] - Universe limit and default sampling seed.
//! - [`OutputConfig`] - Where generated files are written.
//!
//! # Example
//!
//! ```
//! # use multiverse::config::AppConfig;
//! let config: AppConfig = toml::from_str(
//!     r#"
//!     [generation]
//!     max_universes = 50
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.generation().max_universes(), 50);
//! assert_eq!(config.generation().seed(), 0);
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Generation settings section.
    #[serde(default)]
    generation: GenerationConfig,

    /// Output settings section.
    #[serde(default)]
    output: OutputConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(generation: GenerationConfig, output: OutputConfig) -> Self {
        Self { generation, output }
    }

    /// Returns the generation configuration.
    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    /// Returns the output configuration.
    pub fn output(&self) -> &OutputConfig {
        &self.output
    }
}

/// Settings that shape which universes are produced.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Upper bound on the estimated universe count before confirmation is
    /// required.
    max_universes: u64,

    /// Seed for sampled decisions that do not declare one.
    seed: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_universes: 1024,
            seed: 0,
        }
    }
}

impl GenerationConfig {
    /// Creates a new [`GenerationConfig`].
    ///
    /// # Arguments
    ///
    /// * `max_universes` - Estimated count above which the CLI asks first.
    /// * `seed` - Default seed for sampled decisions.
    pub fn new(max_universes: u64, seed: u64) -> Self {
        Self {
            max_universes,
            seed,
        }
    }

    pub fn max_universes(&self) -> u64 {
        self.max_universes
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Output location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `code/`, `summary.json` and `overview.json`.
    directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("multiverse"),
        }
    }
}

impl OutputConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
