//! Time-Delay Embedding Trajectory Classifier
//!
//! Classifies sensor trajectories (for example accelerometer magnitude) by
//! comparing their reconstructed phase-space attractors against a set of
//! trained reference models with k-nearest-neighbour search.
//!
//! # Features
//!
//! - **Per-model embedding**: every model re-embeds the query with its own
//!   delay, dimension and optional PCA basis
//! - **Exact kNN**: kd-tree search with deterministic tie-breaking
//! - **Windowed decisions**: neighbour distances averaged over a match window
//! - **All-or-nothing loading**: a bad registry entry never yields a
//!   half-built classifier
//!
//! # Quick Start
//!
//! ```
//! use std::path::Path;
//! use tde_classifier::{Classifier, ClassifierConfig, ModelDescriptor, ReferenceModel, Trajectory};
//!
//! let descriptor = ModelDescriptor {
//!     name: Some("walk".to_string()),
//!     delay: 1,
//!     embedding_dim: 2,
//!     pca: None,
//!     samples: Some(Trajectory::from_scalars(vec![0.0, 1.0, 0.0, -1.0, 0.0])),
//!     data_file: None,
//! };
//! let model = ReferenceModel::from_descriptor(descriptor, Path::new(""))?;
//! let classifier = Classifier::new(vec![model], ClassifierConfig::new(1, 2))?;
//!
//! let query = Trajectory::from_scalars(vec![0.0, 1.0, 0.0, -1.0]);
//! let result = classifier.classify(&query)?;
//! assert_eq!(result.len(), 3);
//! assert!(result.labels().all(|label| label == "walk"));
//! # Ok::<(), tde_classifier::ClassifierError>(())
//! ```
//!
//! # Output Alignment
//!
//! | Model | τ | d | Points from 10 samples |
//! |-------|---|---|------------------------|
//! | A | 1 | 2 | 9 |
//! | B | 2 | 3 | 6 |
//!
//! A session holding both models emits `min(9, 6) = 6` entries.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]

pub mod classifier;
pub mod config;
pub mod embedding;
pub mod error;
pub mod math;
pub mod model;
pub mod neighbors;
pub mod output;
pub mod registry;
pub mod session;
pub mod trajectory;

// Re-exports for convenient access
pub use classifier::{aligned_length, window_means, Classifier};
pub use config::{ClassifierConfig, OutputFormat, ReaderConfig};
pub use embedding::{DelayEmbedding, EmbeddedSeries};
pub use error::{ClassifierError, ErrorKind, Result};
pub use math::{PcaBasis, PcaSpec};
pub use model::{ModelDescriptor, ReferenceModel};
pub use neighbors::{Neighbor, NeighborIndex};
pub use output::{default_output_path, ClassifiedSample, Classification};
pub use registry::{load_models, parse_registry, read_registry};
pub use session::Session;
pub use trajectory::Trajectory;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(n: usize, period: f64, amplitude: f64) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * i as f64 / period).sin())
            .collect()
    }

    fn model(name: &str, samples: Vec<f64>) -> ReferenceModel {
        ReferenceModel::from_descriptor(
            ModelDescriptor {
                name: Some(name.to_string()),
                delay: 2,
                embedding_dim: 3,
                pca: None,
                samples: Some(Trajectory::from_scalars(samples)),
                data_file: None,
            },
            std::path::Path::new(""),
        )
        .unwrap()
    }

    #[test]
    fn test_full_pipeline() {
        let slow = model("slow", sine(400, 40.0, 1.0));
        let fast = model("fast", sine(400, 8.0, 1.0));
        let classifier = Classifier::new(vec![slow, fast], ClassifierConfig::new(3, 10)).unwrap();

        let result = classifier
            .classify(&Trajectory::from_scalars(sine(120, 8.0, 1.0)))
            .unwrap();
        assert_eq!(result.len(), 116);

        let fast_votes = result.labels().filter(|&l| l == "fast").count();
        assert!(fast_votes > 100, "only {fast_votes} fast votes");
    }
}
