//! Raw sensor trajectories and the text reader that produces them.
//!
//! A [`Trajectory`] is an immutable, time-ordered run of samples. Each sample
//! has the same number of channels (1 for a magnitude signal, 3 for a raw
//! accelerometer triple). Samples are stored row-major.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ReaderConfig;
use crate::error::{ClassifierError, Result};

/// Time-ordered sequence of multi-channel samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Trajectory {
    channels: usize,
    values: Vec<f64>,
}

impl Trajectory {
    /// Build a single-channel trajectory.
    #[must_use]
    pub fn from_scalars(values: Vec<f64>) -> Self {
        Self {
            channels: 1,
            values,
        }
    }

    /// Build a trajectory from equally sized rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows are empty-width or of differing widths.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let channels = rows.first().map_or(1, Vec::len);
        if channels == 0 {
            return Err(ClassifierError::malformed(1, "sample has no channels"));
        }
        let mut values = Vec::with_capacity(rows.len() * channels);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != channels {
                return Err(ClassifierError::malformed(
                    i + 1,
                    format!("expected {channels} values, found {}", row.len()),
                ));
            }
            values.extend_from_slice(row);
        }
        Ok(Self { channels, values })
    }

    /// Read a trajectory from a text file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened or read, and a
    /// malformed-trajectory error for unparsable content.
    pub fn from_path(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ClassifierError::io(path, e))?;
        Self::from_reader(BufReader::new(file), config).map_err(|err| match err {
            ClassifierError::Io { source, .. } => ClassifierError::io(path, source),
            other => other,
        })
    }

    /// Decode a trajectory from line-oriented numeric text.
    ///
    /// Fields are separated by whitespace, commas or semicolons. Blank lines
    /// and `#` comments are ignored.
    ///
    /// # Errors
    ///
    /// Returns a malformed-trajectory error naming the offending line for
    /// non-numeric fields, missing selected columns, or ragged rows.
    pub fn from_reader<R: BufRead>(reader: R, config: &ReaderConfig) -> Result<Self> {
        let limit = config.max_samples.unwrap_or(usize::MAX);
        let mut channels: Option<usize> = None;
        let mut values = Vec::new();
        let mut samples = 0usize;
        let mut skipped = 0usize;
        let mut fields = Vec::new();

        for (line_no, line) in reader.lines().enumerate() {
            if samples >= limit {
                break;
            }
            let line = line.map_err(|e| ClassifierError::io("<trajectory>", e))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if skipped < config.skip_lines {
                skipped += 1;
                continue;
            }

            fields.clear();
            for token in line
                .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
                .filter(|t| !t.is_empty())
            {
                let value: f64 = token.parse().map_err(|_| {
                    ClassifierError::malformed(line_no + 1, format!("'{token}' is not a number"))
                })?;
                if !value.is_finite() {
                    return Err(ClassifierError::malformed(
                        line_no + 1,
                        format!("'{token}' is not finite"),
                    ));
                }
                fields.push(value);
            }

            let width = match &config.columns {
                Some(columns) => {
                    for &col in columns {
                        let value = fields.get(col).ok_or_else(|| {
                            ClassifierError::malformed(
                                line_no + 1,
                                format!("column {col} missing ({} fields)", fields.len()),
                            )
                        })?;
                        values.push(*value);
                    }
                    columns.len()
                }
                None => {
                    values.extend_from_slice(&fields);
                    fields.len()
                }
            };
            if width == 0 {
                return Err(ClassifierError::malformed(line_no + 1, "line has no values"));
            }

            match channels {
                None => channels = Some(width),
                Some(expected) if expected != width => {
                    return Err(ClassifierError::malformed(
                        line_no + 1,
                        format!("expected {expected} values, found {width}"),
                    ));
                }
                Some(_) => {}
            }
            samples += 1;
        }

        Ok(Self {
            channels: channels.unwrap_or(1),
            values,
        })
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len() / self.channels
    }

    /// True if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values per sample.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// The `i`-th sample.
    #[must_use]
    pub fn sample(&self, i: usize) -> &[f64] {
        &self.values[i * self.channels..(i + 1) * self.channels]
    }

    /// Flat row-major sample data.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl TryFrom<Vec<Vec<f64>>> for Trajectory {
    type Error = ClassifierError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(&rows)
    }
}

impl From<Trajectory> for Vec<Vec<f64>> {
    fn from(trajectory: Trajectory) -> Self {
        trajectory
            .values
            .chunks(trajectory.channels)
            .map(<[f64]>::to_vec)
            .collect()
    }
}
