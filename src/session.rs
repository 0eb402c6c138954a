//! Classification session with explicit teardown.
//!
//! A [`Session`] owns a [`Classifier`] from construction until
//! [`Session::teardown`]. After teardown every call fails with
//! [`ClassifierError::SessionClosed`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use tde_classifier::{ClassifierConfig, Session};
//!
//! let mut session = Session::open("models.ini", ClassifierConfig::new(3, 8))?;
//! session.classify_file(Path::new("trace.txt"), None)?; // writes trace.txt.dmp
//! session.teardown();
//! # Ok::<(), tde_classifier::ClassifierError>(())
//! ```

use std::path::Path;

use tracing::info;

use crate::classifier::Classifier;
use crate::config::ClassifierConfig;
use crate::error::{ClassifierError, Result};
use crate::output::{default_output_path, Classification};
use crate::trajectory::Trajectory;

/// Owner of a loaded classifier.
#[derive(Debug)]
pub struct Session {
    classifier: Option<Classifier>,
}

impl Session {
    /// Wrap an already built classifier.
    #[must_use]
    pub const fn new(classifier: Classifier) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// Load the models listed in `registry` and open a session over them.
    ///
    /// # Errors
    ///
    /// Returns the first registry, model or configuration error; no session
    /// exists on failure.
    pub fn open(registry: impl AsRef<Path>, config: ClassifierConfig) -> Result<Self> {
        Classifier::from_registry(registry, config).map(Self::new)
    }

    /// The live classifier.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::SessionClosed`] after teardown.
    pub fn classifier(&self) -> Result<&Classifier> {
        self.classifier.as_ref().ok_or(ClassifierError::SessionClosed)
    }

    /// True until [`Session::teardown`] is called.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.classifier.is_some()
    }

    /// Classify an in-memory trajectory.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::SessionClosed`] after teardown, otherwise
    /// as [`Classifier::classify`].
    pub fn classify(&self, query: &Trajectory) -> Result<Classification> {
        self.classifier()?.classify(query)
    }

    /// Classify a trajectory file. Without `output` the result goes to
    /// `<input>.dmp`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::SessionClosed`] after teardown, otherwise
    /// as [`Classifier::classify_file`].
    pub fn classify_file(&self, input: &Path, output: Option<&Path>) -> Result<Classification> {
        let classifier = self.classifier()?;
        match output {
            Some(output) => classifier.classify_file(input, output),
            None => classifier.classify_file(input, default_output_path(input)),
        }
    }

    /// Release every loaded model.
    pub fn teardown(&mut self) {
        if let Some(classifier) = self.classifier.take() {
            info!(models = classifier.models().len(), "session torn down");
        }
    }
}
