//! Model registry: a line-delimited list of model descriptor paths.
//!
//! ```text
//! # models.ini
//! models/fall.json
//! models/walk.json
//! /opt/models/sit.json
//! ```
//!
//! Blank lines and `#` comments are skipped. Relative paths are resolved
//! against the registry file's directory. Loading is all-or-nothing: the
//! first model that fails aborts the whole load.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ClassifierError, Result};
use crate::model::ReferenceModel;

/// Decode registry entries from a reader, in order.
///
/// # Errors
///
/// Returns a registry error attributed to `origin` if a line cannot be read
/// (including invalid UTF-8).
pub fn parse_registry<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<PathBuf>> {
    let base = origin.parent().unwrap_or_else(|| Path::new(""));
    let mut entries = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line
            .map_err(|e| ClassifierError::registry(origin, format!("line {}: {e}", line_no + 1)))?;
        let entry = line.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        entries.push(base.join(entry));
    }

    Ok(entries)
}

/// Read the model paths listed in a registry file.
///
/// # Errors
///
/// Returns a registry error if the file cannot be opened or read.
pub fn read_registry(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ClassifierError::registry(path, e.to_string()))?;
    parse_registry(BufReader::new(file), path)
}

/// Load every model listed in a registry file.
///
/// # Errors
///
/// Returns a registry error for an unreadable registry, or the first model
/// load error encountered. No models are returned on failure.
pub fn load_models(path: impl AsRef<Path>) -> Result<Vec<ReferenceModel>> {
    let path = path.as_ref();
    let entries = read_registry(path)?;
    info!(registry = %path.display(), entries = entries.len(), "loading models");

    let models = entries
        .iter()
        .map(ReferenceModel::load)
        .collect::<Result<Vec<_>>>()?;

    info!(models = models.len(), "all models loaded");
    Ok(models)
}
