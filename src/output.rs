//! Classification results and their serialized forms.
//!
//! # Text Layout
//!
//! ```text
//! # index	label	score	fall	walk
//! 0	walk	0.125	0.5	0.125
//! 1	walk	0.25	0.75	0.25
//! ```
//!
//! One line per aligned index, tab separated: the index, the winning model's
//! name, its score, then every model's score in registry order.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::OutputFormat;
use crate::error::{ClassifierError, Result};

/// Extension appended to an input path to form the default output path.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "dmp";

/// Decision for one aligned index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSample {
    /// Aligned index into every model's embedded query sequence.
    pub index: usize,
    /// Name of the best-matching model.
    pub label: String,
    /// Registry position of the best-matching model.
    pub model: usize,
    /// Match score of the best-matching model (lower is better).
    pub score: f64,
    /// Match score of every model, in registry order.
    pub scores: Vec<f64>,
}

/// Ordered per-index decisions for one query trajectory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    /// Model names in registry order.
    pub models: Vec<String>,
    /// One entry per aligned index.
    pub samples: Vec<ClassifiedSample>,
}

impl Classification {
    /// Number of aligned entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no entries were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Winning labels in index order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.samples.iter().map(|s| s.label.as_str())
    }

    /// Write the tab-separated text form.
    ///
    /// # Errors
    ///
    /// Propagates writer failures.
    pub fn write_text<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        write!(out, "# index\tlabel\tscore")?;
        for name in &self.models {
            write!(out, "\t{name}")?;
        }
        writeln!(out)?;

        for sample in &self.samples {
            write!(out, "{}\t{}\t{}", sample.index, sample.label, sample.score)?;
            for score in &sample.scores {
                write!(out, "\t{score}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Write the JSON form.
    ///
    /// # Errors
    ///
    /// Propagates writer and serialization failures.
    pub fn write_json<W: Write>(&self, out: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(out, self).map_err(std::io::Error::from)
    }

    /// Render in the given format.
    ///
    /// # Errors
    ///
    /// Propagates serialization failures.
    pub fn render(&self, format: OutputFormat) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        match format {
            OutputFormat::Text => self.write_text(&mut buf)?,
            OutputFormat::Json => self.write_json(&mut buf)?,
        }
        Ok(buf)
    }

    /// Write to a file.
    ///
    /// The whole document is rendered before the file is created. If the
    /// write fails the file is removed, so a failed save leaves no output.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn save(&self, path: impl AsRef<Path>, format: OutputFormat) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.render(format).map_err(|e| ClassifierError::io(path, e))?;

        let mut file = fs::File::create(path).map_err(|e| ClassifierError::io(path, e))?;
        if let Err(e) = file.write_all(&bytes).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(path);
            return Err(ClassifierError::io(path, e));
        }
        Ok(())
    }
}

/// Default output path for an input: `<input>.dmp`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".");
    name.push(DEFAULT_OUTPUT_EXTENSION);
    PathBuf::from(name)
}
