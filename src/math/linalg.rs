//! Linear algebra utilities for embedded points.
//!
//! This module provides PCA projection of embedded series onto a
//! precomputed orthonormal basis, using nalgebra for the matrix work.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddedSeries;
use crate::error::{ClassifierError, Result};

/// Tolerance for the orthonormality check `B·Bᵀ ≈ I`.
pub const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// Serialized form of a PCA basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaSpec {
    /// Centering reference. Omitted means no centering.
    #[serde(default)]
    pub mean: Option<Vec<f64>>,

    /// Principal directions, one row per output component.
    pub components: Vec<Vec<f64>>,
}

/// Validated PCA basis.
///
/// Projects `d`-dimensional points to `p` dimensions via `y = B (x − μ)`,
/// where the rows of `B` are orthonormal.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaBasis {
    mean: DVector<f64>,
    components: DMatrix<f64>,
}

impl PcaBasis {
    /// Build a basis for `input_dim`-dimensional points.
    ///
    /// # Errors
    ///
    /// Returns a message describing the inconsistency if the basis is empty,
    /// has more components than `input_dim`, has rows or a mean of the wrong
    /// length, or is not orthonormal.
    pub fn new(spec: &PcaSpec, input_dim: usize) -> std::result::Result<Self, String> {
        let p = spec.components.len();
        if p == 0 {
            return Err("PCA basis has no components".to_string());
        }
        if p > input_dim {
            return Err(format!(
                "PCA dimension {p} exceeds embedding dimension {input_dim}"
            ));
        }
        if let Some(bad) = spec.components.iter().position(|row| row.len() != input_dim) {
            return Err(format!(
                "PCA component {bad} has length {}, expected {input_dim}",
                spec.components[bad].len()
            ));
        }

        let mean = match &spec.mean {
            Some(mean) if mean.len() != input_dim => {
                return Err(format!(
                    "PCA mean has length {}, expected {input_dim}",
                    mean.len()
                ));
            }
            Some(mean) => DVector::from_vec(mean.clone()),
            None => DVector::zeros(input_dim),
        };

        let rows: Vec<f64> = spec.components.iter().flatten().copied().collect();
        let components = DMatrix::from_row_slice(p, input_dim, &rows);

        let gram = &components * components.transpose();
        let deviation = (gram - DMatrix::<f64>::identity(p, p)).amax();
        if !deviation.is_finite() || deviation > ORTHONORMAL_TOLERANCE {
            return Err(format!(
                "PCA components are not orthonormal (max deviation {deviation:.3e})"
            ));
        }

        Ok(Self { mean, components })
    }

    /// Dimension of points accepted.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.components.ncols()
    }

    /// Dimension of projected points.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.components.nrows()
    }

    /// Project a single point.
    ///
    /// # Errors
    ///
    /// Returns a dimension mismatch if `point` is not `input_dim` long.
    pub fn project_point(&self, point: &[f64]) -> Result<Vec<f64>> {
        if point.len() != self.input_dim() {
            return Err(ClassifierError::dimension_mismatch(
                self.input_dim(),
                point.len(),
            ));
        }
        let centered = DVector::from_vec(point.to_vec()) - &self.mean;
        Ok((&self.components * centered).as_slice().to_vec())
    }

    /// Project every point of a series, preserving order.
    ///
    /// # Errors
    ///
    /// Returns a dimension mismatch if the series dimension differs from
    /// `input_dim`.
    pub fn project(&self, series: &EmbeddedSeries) -> Result<EmbeddedSeries> {
        if series.dim() != self.input_dim() {
            return Err(ClassifierError::dimension_mismatch(
                self.input_dim(),
                series.dim(),
            ));
        }
        if series.is_empty() {
            return EmbeddedSeries::from_flat(Vec::new(), self.output_dim());
        }

        // Points as columns: Y = B (X - μ 1ᵀ)
        let mut points = DMatrix::from_column_slice(series.dim(), series.len(), series.as_slice());
        for mut column in points.column_iter_mut() {
            column -= &self.mean;
        }
        let projected = &self.components * points;

        EmbeddedSeries::from_flat(projected.as_slice().to_vec(), self.output_dim())
    }
}

/// Euclidean distance between two equal-length points.
#[must_use]
#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    squared_euclidean(a, b).sqrt()
}

/// Squared Euclidean distance between two equal-length points.
#[must_use]
#[inline]
pub fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn rotated_plane() -> PcaSpec {
        PcaSpec {
            mean: Some(vec![1.0, 1.0, 0.0]),
            components: vec![
                vec![FRAC_1_SQRT_2, FRAC_1_SQRT_2, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        }
    }

    #[test]
    fn test_project_point() {
        let basis = PcaBasis::new(&rotated_plane(), 3).unwrap();
        assert_eq!(basis.input_dim(), 3);
        assert_eq!(basis.output_dim(), 2);

        let y = basis.project_point(&[2.0, 2.0, 5.0]).unwrap();
        assert_eq!(y.len(), 2);
        assert_relative_eq!(y[0], 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(y[1], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_project_series_matches_pointwise() {
        let basis = PcaBasis::new(&rotated_plane(), 3).unwrap();
        let series =
            EmbeddedSeries::from_flat(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, -1.0, 0.5, 9.0], 3)
                .unwrap();

        let projected = basis.project(&series).unwrap();
        assert_eq!(projected.len(), 3);
        assert_eq!(projected.dim(), 2);
        for (i, point) in series.points().enumerate() {
            let expected = basis.project_point(point).unwrap();
            for (a, b) in projected.point(i).iter().zip(expected.iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_projection_is_deterministic() {
        let basis = PcaBasis::new(&rotated_plane(), 3).unwrap();
        let series = EmbeddedSeries::from_flat(vec![0.3, -1.2, 7.5, 2.0, 2.0, 2.0], 3).unwrap();
        assert_eq!(basis.project(&series).unwrap(), basis.project(&series).unwrap());
    }

    #[test]
    fn test_missing_mean_means_no_centering() {
        let spec = PcaSpec {
            mean: None,
            components: vec![vec![0.0, 1.0]],
        };
        let basis = PcaBasis::new(&spec, 2).unwrap();
        assert_eq!(basis.project_point(&[3.0, 4.0]).unwrap(), vec![4.0]);
    }

    #[test]
    fn test_rejects_inconsistent_bases() {
        let mut spec = rotated_plane();
        assert!(PcaBasis::new(&spec, 2).is_err());

        spec.components.push(vec![1.0, 0.0, 0.0]);
        spec.components.push(vec![0.0, 1.0, 0.0]);
        let err = PcaBasis::new(&spec, 3).unwrap_err();
        assert!(err.contains("exceeds"));

        let skewed = PcaSpec {
            mean: None,
            components: vec![vec![1.0, 0.0], vec![1.0, 1.0]],
        };
        assert!(PcaBasis::new(&skewed, 2).unwrap_err().contains("orthonormal"));

        let short_mean = PcaSpec {
            mean: Some(vec![0.0]),
            components: vec![vec![1.0, 0.0]],
        };
        assert!(PcaBasis::new(&short_mean, 2).is_err());

        let empty = PcaSpec {
            mean: None,
            components: Vec::new(),
        };
        assert!(PcaBasis::new(&empty, 2).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let basis = PcaBasis::new(&rotated_plane(), 3).unwrap();
        assert!(basis.project_point(&[1.0, 2.0]).is_err());
        let series = EmbeddedSeries::from_flat(vec![1.0, 2.0], 2).unwrap();
        assert!(basis.project(&series).is_err());
    }

    #[test]
    fn test_euclidean() {
        assert_relative_eq!(euclidean(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_relative_eq!(squared_euclidean(&[1.0, 1.0], &[2.0, 3.0]), 5.0);
    }
}
