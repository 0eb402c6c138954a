//! Time-delay embedding.
//!
//! Reconstructs a phase-space trajectory from a sampled signal by stacking
//! delayed copies of it. For delay `τ` and dimension `d` the point starting
//! at sample `i` is
//!
//! ```text
//! v_i = (x_i, x_{i+τ}, x_{i+2τ}, …, x_{i+(d-1)τ})
//! ```
//!
//! With `c` channels per sample each `x` contributes `c` coordinates, so
//! points have `d·c` components. A trajectory of `N` samples yields
//! `N - (d-1)τ` points.
//!
//! # Example
//!
//! ```
//! use tde_classifier::{DelayEmbedding, Trajectory};
//!
//! let signal = Trajectory::from_scalars((0..10).map(f64::from).collect());
//! let embedding = DelayEmbedding::new(2, 3)?;
//! let series = embedding.embed(&signal);
//!
//! assert_eq!(series.len(), 6);
//! assert_eq!(series.point(0), &[0.0, 2.0, 4.0]);
//! # Ok::<(), tde_classifier::ClassifierError>(())
//! ```

use crate::error::{ClassifierError, Result};
use crate::trajectory::Trajectory;

/// Delay-embedding parameters.
///
/// The span `(d-1)τ` of a constructed value always fits in `usize`, so the
/// sample offsets used by [`DelayEmbedding::embed`] cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayEmbedding {
    delay: usize,
    dimension: usize,
}

impl DelayEmbedding {
    /// Create embedding parameters.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `delay` or `dimension` is zero, or
    /// if the span `(d-1)τ` does not fit in `usize`.
    pub fn new(delay: usize, dimension: usize) -> Result<Self> {
        if delay == 0 {
            return Err(ClassifierError::configuration("delay must be at least 1"));
        }
        if dimension == 0 {
            return Err(ClassifierError::configuration(
                "embedding dimension must be at least 1",
            ));
        }
        (dimension - 1)
            .checked_mul(delay)
            .and_then(|span| span.checked_add(1))
            .ok_or_else(|| {
                ClassifierError::configuration(format!(
                    "delay {delay} with dimension {dimension} spans more samples than addressable"
                ))
            })?;
        Ok(Self { delay, dimension })
    }

    /// Delay `τ` in samples.
    #[must_use]
    pub const fn delay(&self) -> usize {
        self.delay
    }

    /// Embedding dimension `d`.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// History window spanned by one point, `(d-1)τ`.
    #[must_use]
    pub const fn span(&self) -> usize {
        (self.dimension - 1) * self.delay
    }

    /// Minimum trajectory length that produces at least one point.
    #[must_use]
    pub const fn min_samples(&self) -> usize {
        self.span() + 1
    }

    /// Number of points produced from `samples` raw samples.
    #[must_use]
    pub const fn output_len(&self, samples: usize) -> usize {
        samples.saturating_sub(self.span())
    }

    /// Embed a trajectory. Too-short input yields an empty series.
    #[must_use]
    pub fn embed(&self, trajectory: &Trajectory) -> EmbeddedSeries {
        let channels = trajectory.channels();
        let dim = self.dimension * channels;
        let len = self.output_len(trajectory.len());

        let mut data = Vec::with_capacity(len * dim);
        for i in 0..len {
            // i + lag·τ <= (len - 1) + span < samples
            for offset in (0..self.dimension).map(|lag| lag * self.delay) {
                data.extend_from_slice(trajectory.sample(i + offset));
            }
        }

        EmbeddedSeries { data, dim, len }
    }
}

/// Ordered set of fixed-dimension points with its shape.
///
/// Returned by every embedding and projection step so callers always know
/// how many points they hold and of what dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedSeries {
    data: Vec<f64>,
    dim: usize,
    len: usize,
}

impl EmbeddedSeries {
    /// Build a series from flat row-major point data.
    ///
    /// # Errors
    ///
    /// Returns a dimension mismatch if `data` is not a whole number of
    /// `dim`-sized points.
    pub fn from_flat(data: Vec<f64>, dim: usize) -> Result<Self> {
        if dim == 0 || data.len() % dim != 0 {
            return Err(ClassifierError::dimension_mismatch(dim, data.len()));
        }
        let len = data.len() / dim;
        Ok(Self { data, dim, len })
    }

    /// Number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True if the series holds no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Dimension of every point.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// The `i`-th point.
    #[must_use]
    pub fn point(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate over points in order.
    pub fn points(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.data.chunks_exact(self.dim)
    }

    /// Keep only the first `len` points.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
            self.data.truncate(len * self.dim);
        }
    }

    /// Flat row-major data.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
