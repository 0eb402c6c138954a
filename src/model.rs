//! Trained reference models.
//!
//! A [`ReferenceModel`] is one behaviour class: its embedding parameters,
//! an optional PCA basis and the attractor built from its own training
//! trajectory. Everything is fixed at load time and only read afterwards.
//!
//! Models are stored as JSON descriptors:
//!
//! ```json
//! {
//!   "name": "fall",
//!   "delay": 2,
//!   "embedding_dim": 3,
//!   "pca": { "mean": [0.0, 0.0, 0.0], "components": [[1.0, 0.0, 0.0]] },
//!   "data_file": "fall.txt"
//! }
//! ```
//!
//! `data_file` is resolved against the descriptor's directory. Training
//! samples may instead be given inline as `"samples": [[x], [x], …]`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ReaderConfig;
use crate::embedding::{DelayEmbedding, EmbeddedSeries};
use crate::error::{ClassifierError, Result};
use crate::math::linalg::{PcaBasis, PcaSpec};
use crate::neighbors::NeighborIndex;
use crate::trajectory::Trajectory;

/// Serialized model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDescriptor {
    /// Class label. Defaults to the descriptor file stem.
    #[serde(default)]
    pub name: Option<String>,

    /// Delay `τ` in samples.
    pub delay: usize,

    /// Embedding dimension `d`.
    pub embedding_dim: usize,

    /// Optional PCA basis applied after embedding.
    #[serde(default)]
    pub pca: Option<PcaSpec>,

    /// Inline training trajectory.
    #[serde(default)]
    pub samples: Option<Trajectory>,

    /// Training trajectory file, relative to the descriptor.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

/// Loaded, immutable behaviour model.
#[derive(Debug)]
pub struct ReferenceModel {
    name: String,
    embedding: DelayEmbedding,
    channels: usize,
    pca: Option<PcaBasis>,
    index: NeighborIndex,
}

impl ReferenceModel {
    /// Load a model from a descriptor file.
    ///
    /// # Errors
    ///
    /// Returns a model load error if the descriptor is missing, unreadable,
    /// malformed or inconsistent, or its training data cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();

        let text = std::fs::read_to_string(path)
            .map_err(|e| ClassifierError::model_load(&label, e.to_string()))?;
        let mut descriptor: ModelDescriptor = serde_json::from_str(&text)
            .map_err(|e| ClassifierError::model_load(&label, format!("malformed descriptor: {e}")))?;

        if descriptor.name.is_none() {
            descriptor.name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned());
        }
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_descriptor(descriptor, base)
    }

    /// Build a model from a descriptor, resolving `data_file` against `base`.
    ///
    /// # Errors
    ///
    /// Returns a model load error if the parameters are inconsistent or the
    /// training trajectory is missing or too short.
    pub fn from_descriptor(descriptor: ModelDescriptor, base: &Path) -> Result<Self> {
        let name = descriptor.name.unwrap_or_else(|| "unnamed".to_string());
        let fail = |reason: String| ClassifierError::model_load(&name, reason);

        let embedding = DelayEmbedding::new(descriptor.delay, descriptor.embedding_dim)
            .map_err(|e| fail(e.to_string()))?;

        let trajectory = match (descriptor.samples, descriptor.data_file) {
            (Some(samples), None) => samples,
            (None, Some(file)) => {
                let file = base.join(file);
                Trajectory::from_path(&file, &ReaderConfig::default()).map_err(|e| {
                    fail(format!("training data {}: {e}", file.display()))
                })?
            }
            (Some(_), Some(_)) => {
                return Err(fail("both samples and data_file given".to_string()));
            }
            (None, None) => return Err(fail("no training data".to_string())),
        };

        if trajectory.len() < embedding.min_samples() {
            return Err(fail(format!(
                "training trajectory has {} samples, embedding needs at least {}",
                trajectory.len(),
                embedding.min_samples()
            )));
        }

        let channels = trajectory.channels();
        let pca = descriptor
            .pca
            .as_ref()
            .map(|spec| PcaBasis::new(spec, embedding.dimension() * channels))
            .transpose()
            .map_err(fail)?;

        let reference = embed_and_project(embedding, pca.as_ref(), &trajectory)?;
        debug!(
            model = %name,
            points = reference.len(),
            dim = reference.dim(),
            "built reference attractor"
        );
        info!(
            model = %name,
            delay = embedding.delay(),
            embedding_dim = embedding.dimension(),
            pca_dim = pca.as_ref().map(PcaBasis::output_dim),
            "loaded model"
        );

        Ok(Self {
            name,
            embedding,
            channels,
            pca,
            index: NeighborIndex::build(reference),
        })
    }

    /// Embed and, when a basis is present, project a trajectory with this
    /// model's parameters.
    ///
    /// # Errors
    ///
    /// Returns a dimension mismatch if the trajectory's channel count differs
    /// from the model's, and an insufficient data error if it is too short.
    pub fn embed(&self, trajectory: &Trajectory) -> Result<EmbeddedSeries> {
        if trajectory.channels() != self.channels {
            return Err(ClassifierError::dimension_mismatch(
                self.channels,
                trajectory.channels(),
            ));
        }
        if trajectory.len() < self.embedding.min_samples() {
            return Err(ClassifierError::insufficient_data(
                &self.name,
                self.embedding.min_samples(),
                trajectory.len(),
            ));
        }

        embed_and_project(self.embedding, self.pca.as_ref(), trajectory)
    }

    /// Class label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delay-embedding parameters.
    #[must_use]
    pub const fn embedding(&self) -> DelayEmbedding {
        self.embedding
    }

    /// Channels per sample expected from trajectories.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// PCA basis, if enabled.
    #[must_use]
    pub const fn pca(&self) -> Option<&PcaBasis> {
        self.pca.as_ref()
    }

    /// Dimension of points compared by this model.
    #[must_use]
    pub fn point_dim(&self) -> usize {
        self.pca.as_ref().map_or_else(
            || self.embedding.dimension() * self.channels,
            PcaBasis::output_dim,
        )
    }

    /// Nearest-neighbour index over the reference attractor.
    #[must_use]
    pub const fn index(&self) -> &NeighborIndex {
        &self.index
    }
}

fn embed_and_project(
    embedding: DelayEmbedding,
    pca: Option<&PcaBasis>,
    trajectory: &Trajectory,
) -> Result<EmbeddedSeries> {
    let embedded = embedding.embed(trajectory);
    match pca {
        Some(basis) => basis.project(&embedded),
        None => Ok(embedded),
    }
}
