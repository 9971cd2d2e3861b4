//! Writing a generated multiverse to disk.
//!
//! The output directory receives:
//!
//! - `code/universe_<n><ext>` - one file per universe, numbered from 1, with
//!   the extension of the template
//! - `summary.json` - file name, path and decisions of every universe
//! - `overview.json` - the analysis decision graph and the options of its
//!   decisions

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde::Serialize;

use multiverse::{MultiverseError, Overview, Summary, history::Universe};

/// One entry of `summary.json`.
#[derive(Serialize)]
struct SummaryEntry<'a> {
    filename: String,
    #[serde(flatten)]
    summary: &'a Summary,
}

/// Writes universes and their summaries under one directory.
#[derive(Debug)]
pub struct OutputWriter {
    directory: PathBuf,
    extension: String,
}

impl OutputWriter {
    /// Create a writer for `directory`, naming universe files after the
    /// extension of `template`.
    pub fn new(directory: impl Into<PathBuf>, template: impl AsRef<Path>) -> Self {
        let extension = template
            .as_ref()
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        Self {
            directory: directory.into(),
            extension,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name of the universe at `index` (zero-based).
    pub fn file_name(&self, index: usize) -> String {
        format!("universe_{}{}", index + 1, self.extension)
    }

    /// Write every file of the multiverse.
    ///
    /// Universe files left from an earlier run are removed first.
    ///
    /// # Errors
    ///
    /// Returns `MultiverseError::Io` when a directory or file cannot be
    /// created or written.
    pub fn write(
        &self,
        universes: &[Universe],
        summaries: &[Summary],
        overview: &Overview,
    ) -> Result<(), MultiverseError> {
        let code = self.directory.join("code");
        if code.exists() {
            debug!(path = code.display().to_string(); "Removing previous universes");
            fs::remove_dir_all(&code)?;
        }
        fs::create_dir_all(&code)?;

        for (index, universe) in universes.iter().enumerate() {
            fs::write(code.join(self.file_name(index)), universe.text())?;
        }
        debug!(count = universes.len(); "Universe files written");

        let entries: Vec<SummaryEntry<'_>> = summaries
            .iter()
            .enumerate()
            .map(|(index, summary)| SummaryEntry {
                filename: self.file_name(index),
                summary,
            })
            .collect();
        write_json(&self.directory.join("summary.json"), &entries)?;
        write_json(&self.directory.join("overview.json"), overview)?;

        info!(
            directory = self.directory.display().to_string(),
            universes = universes.len();
            "Multiverse written"
        );
        Ok(())
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), MultiverseError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value).map_err(io::Error::from)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
