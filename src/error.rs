//! Error types for trajectory classification.
//!
//! Every fallible operation in the crate returns [`ClassifierError`]. The
//! variants carry enough context to tell a caller which model, file or line
//! was at fault; [`ClassifierError::kind`] collapses them into the five
//! categories a host application branches on.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for classification operations.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The model registry list is unreadable or malformed.
    #[error("Registry error in {}: {reason}", .path.display())]
    Registry { path: PathBuf, reason: String },

    /// A referenced model is missing, corrupt or internally inconsistent.
    #[error("Failed to load model '{model}': {reason}")]
    ModelLoad { model: String, reason: String },

    /// The query trajectory is too short for a model's embedding parameters.
    #[error("Insufficient data for model '{model}': need at least {required} samples, got {actual}")]
    InsufficientData {
        model: String,
        required: usize,
        actual: usize,
    },

    /// A file could not be opened, read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Session parameters are invalid.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A trajectory text source could not be parsed. Reported as
    /// [`ErrorKind::Io`].
    #[error("Malformed trajectory at line {line}: {reason}")]
    MalformedTrajectory { line: usize, reason: String },

    /// Point dimensions disagree between a query and a reference set.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The session has been torn down.
    #[error("Classification session is closed")]
    SessionClosed,
}

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Registry,
    ModelLoad,
    InsufficientData,
    Io,
    Configuration,
}

/// Result type alias for classification operations.
pub type Result<T> = std::result::Result<T, ClassifierError>;

impl ClassifierError {
    /// Create a registry error.
    #[must_use]
    pub fn registry(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Registry {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a model load error.
    #[must_use]
    pub fn model_load(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelLoad {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Create an insufficient data error.
    #[must_use]
    pub fn insufficient_data(model: impl Into<String>, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            model: model.into(),
            required,
            actual,
        }
    }

    /// Create an I/O error bound to a path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a malformed trajectory error.
    #[must_use]
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedTrajectory {
            line,
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub const fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Registry { .. } => ErrorKind::Registry,
            Self::ModelLoad { .. } => ErrorKind::ModelLoad,
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::Io { .. } | Self::MalformedTrajectory { .. } => ErrorKind::Io,
            Self::Configuration(_) | Self::DimensionMismatch { .. } | Self::SessionClosed => {
                ErrorKind::Configuration
            }
        }
    }
}
