//! Windowed nearest-neighbour classification against reference models.
//!
//! # Pipeline Overview
//!
//! 1. Embed (and project) the query once per model with that model's own
//!    delay, dimension and PCA basis
//! 2. Align all sequences to `tlength`, the shortest sequence length
//! 3. Score each aligned point per model: mean distance to its `k` nearest
//!    reference points
//! 4. Average point scores over the match window ending at each index
//! 5. Pick the model with the lowest window score at each index
//!
//! Windows look backwards: index `i` averages points
//! `max(0, i - match_steps + 1) ..= i`, so the first `match_steps - 1`
//! indices use a partial window. Equal scores go to the model listed first.

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::ClassifierConfig;
use crate::embedding::EmbeddedSeries;
use crate::error::{ClassifierError, Result};
use crate::model::ReferenceModel;
use crate::output::{ClassifiedSample, Classification};
use crate::registry::load_models;
use crate::trajectory::Trajectory;

/// A loaded set of reference models plus matching parameters.
///
/// Immutable once built; classification calls only read it, so one
/// classifier can serve any number of calls.
#[derive(Debug)]
pub struct Classifier {
    models: Vec<ReferenceModel>,
    config: ClassifierConfig,
}

impl Classifier {
    /// Create a classifier over already loaded models.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `models` is empty or the
    /// configuration is invalid.
    pub fn new(models: Vec<ReferenceModel>, config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        if models.is_empty() {
            return Err(ClassifierError::configuration("no models loaded"));
        }

        for model in &models {
            if model.index().len() < config.neighbors {
                warn!(
                    model = model.name(),
                    reference_points = model.index().len(),
                    k = config.neighbors,
                    "reference set smaller than k; using all points"
                );
            }
        }

        Ok(Self { models, config })
    }

    /// Load every model in a registry file and build a classifier.
    ///
    /// # Errors
    ///
    /// Returns the registry or model error that aborted loading, or a
    /// configuration error as for [`Classifier::new`].
    pub fn from_registry(path: impl AsRef<Path>, config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Self::new(load_models(path)?, config)
    }

    /// Loaded models in registry order.
    #[must_use]
    pub fn models(&self) -> &[ReferenceModel] {
        &self.models
    }

    /// Matching parameters.
    #[must_use]
    pub const fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Embed and project the query under every model, in registry order.
    ///
    /// # Errors
    ///
    /// Returns an insufficient data error if the query is too short for any
    /// model, or a dimension mismatch if its channel count is wrong.
    pub fn embed_query(&self, query: &Trajectory) -> Result<Vec<EmbeddedSeries>> {
        let sequences = self
            .models
            .par_iter()
            .map(|model| model.embed(query))
            .collect::<Result<Vec<_>>>()?;

        for (model, series) in self.models.iter().zip(&sequences) {
            debug!(model = model.name(), points = series.len(), dim = series.dim(), "embedded query");
        }
        Ok(sequences)
    }

    /// Classify a query trajectory.
    ///
    /// # Errors
    ///
    /// Returns an insufficient data error if any model's query embedding is
    /// empty. No entries are produced on failure.
    pub fn classify(&self, query: &Trajectory) -> Result<Classification> {
        let mut sequences = self.embed_query(query)?;
        let tlength = aligned_length(&sequences);
        debug!(tlength, "aligned query sequences");

        for series in &mut sequences {
            series.truncate(tlength);
        }

        let k = self.config.neighbors;
        let steps = self.config.match_steps;
        let window_scores = self
            .models
            .par_iter()
            .zip(sequences.par_iter())
            .map(|(model, series)| -> Result<Vec<f64>> {
                let point_scores = series
                    .points()
                    .map(|point| model.index().mean_distance(point, k))
                    .collect::<Result<Vec<_>>>()?;
                Ok(window_means(&point_scores, steps))
            })
            .collect::<Result<Vec<_>>>()?;

        let samples: Vec<ClassifiedSample> = (0..tlength)
            .map(|i| {
                let scores: Vec<f64> = window_scores.iter().map(|s| s[i]).collect();
                let (best, score) = best_model(&scores);
                ClassifiedSample {
                    index: i,
                    label: self.models[best].name().to_string(),
                    model: best,
                    score,
                    scores,
                }
            })
            .collect();

        info!(
            samples = query.len(),
            entries = samples.len(),
            k,
            match_steps = steps,
            "classified trajectory"
        );

        Ok(Classification {
            models: self.models.iter().map(|m| m.name().to_string()).collect(),
            samples,
        })
    }

    /// Read a trajectory file, classify it and write the result.
    ///
    /// Nothing is written unless classification succeeds.
    ///
    /// # Errors
    ///
    /// Returns an I/O or malformed-trajectory error for the input, any
    /// classification error, or an I/O error for the output.
    pub fn classify_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<Classification> {
        let input = input.as_ref();
        let output = output.as_ref();

        let query = Trajectory::from_path(input, &self.config.reader)?;
        let result = self.classify(&query)?;
        result.save(output, self.config.output_format)?;

        info!(input = %input.display(), output = %output.display(), "wrote classification");
        Ok(result)
    }
}

/// Number of aligned indices: the shortest sequence length.
#[must_use]
pub fn aligned_length(sequences: &[EmbeddedSeries]) -> usize {
    sequences.iter().map(EmbeddedSeries::len).min().unwrap_or(0)
}

/// Mean of each backward-looking window of up to `steps` values.
#[must_use]
pub fn window_means(values: &[f64], steps: usize) -> Vec<f64> {
    let steps = steps.max(1);
    (0..values.len())
        .map(|i| {
            let window = &values[(i + 1).saturating_sub(steps)..=i];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

/// Lowest score and its position; the first wins on ties.
fn best_model(scores: &[f64]) -> (usize, f64) {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, s)| {
            if s < best.1 {
                (i, s)
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelDescriptor;
    use approx::assert_relative_eq;

    fn model(name: &str, delay: usize, dim: usize, samples: Vec<f64>) -> ReferenceModel {
        ReferenceModel::from_descriptor(
            ModelDescriptor {
                name: Some(name.to_string()),
                delay,
                embedding_dim: dim,
                pca: None,
                samples: Some(Trajectory::from_scalars(samples)),
                data_file: None,
            },
            Path::new(""),
        )
        .unwrap()
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_rejects_empty_model_set() {
        let err = Classifier::new(Vec::new(), ClassifierConfig::default()).unwrap_err();
        assert!(matches!(err, ClassifierError::Configuration(_)));
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        let models = vec![model("a", 1, 2, ramp(5))];
        assert!(Classifier::new(models, ClassifierConfig::new(0, 1)).is_err());
        let models = vec![model("a", 1, 2, ramp(5))];
        assert!(Classifier::new(models, ClassifierConfig::new(1, 0)).is_err());
    }

    #[test]
    fn test_tlength_is_minimum() {
        let classifier = Classifier::new(
            vec![model("a", 1, 2, ramp(20)), model("b", 2, 3, ramp(20))],
            ClassifierConfig::default(),
        )
        .unwrap();
        let query = Trajectory::from_scalars(ramp(10));

        let sequences = classifier.embed_query(&query).unwrap();
        assert_eq!(sequences[0].len(), 9);
        assert_eq!(sequences[1].len(), 6);
        assert_eq!(aligned_length(&sequences), 6);

        let result = classifier.classify(&query).unwrap();
        assert_eq!(result.len(), 6);
        assert!(result.samples.iter().enumerate().all(|(i, s)| s.index == i));
        assert!(result.samples.iter().all(|s| s.scores.len() == 2));
    }

    #[test]
    fn test_exact_match_scores_zero() {
        // Reference holds the query's embedded point at index 3: (3, 4).
        let classifier = Classifier::new(
            vec![model("only", 1, 2, vec![100.0, 3.0, 4.0, 200.0])],
            ClassifierConfig::new(1, 1),
        )
        .unwrap();
        let query = Trajectory::from_scalars(ramp(8));

        let result = classifier.classify(&query).unwrap();
        assert_eq!(result.samples[3].score, 0.0);
        assert_eq!(result.samples[3].label, "only");
        assert!(result.labels().all(|l| l == "only"));
    }

    #[test]
    fn test_picks_closest_model() {
        let low = model("low", 1, 2, vec![0.0; 10]);
        let high = model("high", 1, 2, vec![10.0; 10]);
        let classifier = Classifier::new(vec![low, high], ClassifierConfig::new(1, 2)).unwrap();

        let mut query = vec![0.5; 6];
        query.extend(vec![9.5; 6]);
        let result = classifier.classify(&Trajectory::from_scalars(query)).unwrap();

        assert_eq!(result.len(), 11);
        assert_eq!(result.samples[0].label, "low");
        assert_eq!(result.samples[10].label, "high");
        assert_eq!(result.samples[10].model, 1);
    }

    #[test]
    fn test_ties_go_to_first_model() {
        let a = model("a", 1, 1, vec![1.0, 2.0]);
        let b = model("b", 1, 1, vec![1.0, 2.0]);
        let classifier = Classifier::new(vec![a, b], ClassifierConfig::default()).unwrap();
        let result = classifier
            .classify(&Trajectory::from_scalars(vec![1.5, 1.5]))
            .unwrap();
        assert!(result.samples.iter().all(|s| s.model == 0));
    }

    #[test]
    fn test_too_short_query() {
        let classifier = Classifier::new(
            vec![model("a", 1, 2, ramp(10)), model("b", 3, 3, ramp(10))],
            ClassifierConfig::default(),
        )
        .unwrap();
        let err = classifier
            .classify(&Trajectory::from_scalars(ramp(6)))
            .unwrap_err();
        assert!(matches!(
            err,
            ClassifierError::InsufficientData { required: 7, actual: 6, .. }
        ));
    }

    #[test]
    fn test_window_means() {
        let means = window_means(&[1.0, 3.0, 5.0, 7.0], 2);
        assert_eq!(means.len(), 4);
        assert_relative_eq!(means[0], 1.0);
        assert_relative_eq!(means[1], 2.0);
        assert_relative_eq!(means[2], 4.0);
        assert_relative_eq!(means[3], 6.0);

        let whole = window_means(&[2.0, 4.0], 10);
        assert_relative_eq!(whole[1], 3.0);
        assert!(window_means(&[], 3).is_empty());
    }

    #[test]
    fn test_window_smooths_single_outlier() {
        let a = model("steady", 1, 1, vec![0.0; 5]);
        let b = model("spike", 1, 1, vec![5.0; 5]);

        let query = Trajectory::from_scalars(vec![0.0, 0.0, 0.0, 5.0, 0.0, 0.0]);
        let noisy = Classifier::new(vec![a, b], ClassifierConfig::new(1, 1)).unwrap();
        assert_eq!(noisy.classify(&query).unwrap().samples[3].label, "spike");

        let a = model("steady", 1, 1, vec![0.0; 5]);
        let b = model("spike", 1, 1, vec![5.0; 5]);
        let smoothed = Classifier::new(vec![a, b], ClassifierConfig::new(1, 4)).unwrap();
        assert_eq!(smoothed.classify(&query).unwrap().samples[3].label, "steady");
    }

    #[test]
    fn test_models_reusable_after_failure() {
        let classifier =
            Classifier::new(vec![model("a", 2, 2, ramp(10))], ClassifierConfig::default())
                .unwrap();
        assert!(classifier.classify(&Trajectory::from_scalars(ramp(2))).is_err());
        assert_eq!(
            classifier
                .classify(&Trajectory::from_scalars(ramp(5)))
                .unwrap()
                .len(),
            3
        );
    }
}
