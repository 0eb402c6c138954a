//! Configuration for trajectory classification.
//!
//! This module provides [`ClassifierConfig`], which centralizes the session
//! tuning parameters (neighbour count and match window), the output format,
//! and the [`ReaderConfig`] used to decode trajectory text files.
//!
//! # Example
//!
//! ```
//! use tde_classifier::ClassifierConfig;
//!
//! let config = ClassifierConfig::new(3, 8);
//! assert!(config.validate().is_ok());
//!
//! let smoothed = ClassifierConfig::default().with_match_steps(16);
//! assert_eq!(smoothed.match_steps, 16);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClassifierError, Result};

/// Session-wide classification parameters.
///
/// # Core Parameters
///
/// - `neighbors`: number of nearest reference points (`k`) averaged per query point.
/// - `match_steps`: number of consecutive embedded points in one match window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Neighbour count `k`.
    /// - 1: exact nearest point, sensitive to noise
    /// - 3-10: smoother distance estimate
    pub neighbors: usize,

    /// Match window length.
    /// Larger windows tolerate short bursts of noise at the cost of
    /// reacting later to a change of behaviour.
    pub match_steps: usize,

    /// Format of the written classification.
    pub output_format: OutputFormat,

    /// How trajectory text files are decoded.
    pub reader: ReaderConfig,
}

/// Serialization format for classification output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated lines with a `#` header.
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

/// Settings for the line-oriented trajectory reader.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Data lines discarded before the first sample.
    pub skip_lines: usize,

    /// Upper bound on samples read. `None` reads to end of input.
    pub max_samples: Option<usize>,

    /// Zero-based columns to keep, in order. `None` keeps every column.
    pub columns: Option<Vec<usize>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            neighbors: 1,
            match_steps: 1,
            output_format: OutputFormat::Text,
            reader: ReaderConfig::default(),
        }
    }
}

impl ClassifierConfig {
    /// Create a configuration with the given `k` and match window.
    #[must_use]
    pub fn new(neighbors: usize, match_steps: usize) -> Self {
        Self {
            neighbors,
            match_steps,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a configuration
    /// error if it is not valid JSON for this struct.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ClassifierError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            ClassifierError::configuration(format!("{}: {e}", path.display()))
        })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `neighbors` or `match_steps` is zero, or if the
    /// reader would produce no samples.
    pub fn validate(&self) -> Result<()> {
        if self.neighbors == 0 {
            return Err(ClassifierError::configuration(
                "neighbors (k) must be positive",
            ));
        }
        if self.match_steps == 0 {
            return Err(ClassifierError::configuration(
                "match_steps must be positive",
            ));
        }
        if self.reader.max_samples == Some(0) {
            return Err(ClassifierError::configuration(
                "max_samples must be positive when set",
            ));
        }
        if matches!(&self.reader.columns, Some(cols) if cols.is_empty()) {
            return Err(ClassifierError::configuration(
                "column selection must not be empty",
            ));
        }
        Ok(())
    }

    /// Set the neighbour count.
    #[must_use]
    pub const fn with_neighbors(mut self, k: usize) -> Self {
        self.neighbors = k;
        self
    }

    /// Set the match window length.
    #[must_use]
    pub const fn with_match_steps(mut self, steps: usize) -> Self {
        self.match_steps = steps;
        self
    }

    /// Set the output format.
    #[must_use]
    pub const fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set the trajectory reader settings.
    #[must_use]
    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }
}

impl ReaderConfig {
    /// Keep only the given columns.
    #[must_use]
    pub fn with_columns(mut self, columns: Vec<usize>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Discard the first `n` data lines.
    #[must_use]
    pub const fn with_skip_lines(mut self, n: usize) -> Self {
        self.skip_lines = n;
        self
    }

    /// Read at most `n` samples.
    #[must_use]
    pub const fn with_max_samples(mut self, n: usize) -> Self {
        self.max_samples = Some(n);
        self
    }
}
