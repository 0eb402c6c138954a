//! Exact k-nearest-neighbour search over a fixed reference set.
//!
//! [`NeighborIndex`] is a kd-tree built once over a model's reference
//! points and queried read-only afterwards, so one index can serve any
//! number of threads. Results are ordered by `(distance, reference index)`:
//! equal distances resolve to the reference point that appears first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::embedding::EmbeddedSeries;
use crate::error::{ClassifierError, Result};
use crate::math::linalg::squared_euclidean;

/// Leaves hold at most this many points before splitting.
const LEAF_SIZE: usize = 16;

/// One search result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the point in the reference set.
    pub index: usize,
    /// Euclidean distance to the query.
    pub distance: f64,
}

#[derive(Debug)]
enum Node {
    Leaf {
        start: usize,
        end: usize,
    },
    Split {
        axis: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// kd-tree over an immutable reference set.
#[derive(Debug)]
pub struct NeighborIndex {
    points: EmbeddedSeries,
    /// Reference indices, permuted so each leaf owns a contiguous range.
    order: Vec<usize>,
    root: Option<Node>,
}

impl NeighborIndex {
    /// Build an index over `points`.
    #[must_use]
    pub fn build(points: EmbeddedSeries) -> Self {
        let mut order: Vec<usize> = (0..points.len()).collect();
        let root = if points.is_empty() {
            None
        } else {
            let len = order.len();
            Some(build_node(&points, &mut order, 0, len))
        };
        Self {
            points,
            order,
            root,
        }
    }

    /// Number of reference points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the reference set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dimension of reference points.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.points.dim()
    }

    /// Reference point set.
    #[must_use]
    pub const fn points(&self) -> &EmbeddedSeries {
        &self.points
    }

    /// Find the `k` nearest reference points to `query`.
    ///
    /// Returns `min(k, len)` neighbours in non-decreasing distance order.
    ///
    /// # Errors
    ///
    /// Returns a dimension mismatch if `query` has the wrong length.
    pub fn nearest(&self, query: &[f64], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim() {
            return Err(ClassifierError::dimension_mismatch(self.dim(), query.len()));
        }
        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut heap = BinaryHeap::with_capacity(k + 1);
        if let Some(root) = &self.root {
            self.search(root, query, k, &mut heap);
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|c| Neighbor {
                index: c.index,
                distance: c.dist_sq.sqrt(),
            })
            .collect())
    }

    /// Mean distance to the `k` nearest reference points.
    ///
    /// # Errors
    ///
    /// Returns a dimension mismatch if `query` has the wrong length.
    pub fn mean_distance(&self, query: &[f64], k: usize) -> Result<f64> {
        let neighbors = self.nearest(query, k)?;
        if neighbors.is_empty() {
            return Ok(f64::INFINITY);
        }
        let total: f64 = neighbors.iter().map(|n| n.distance).sum();
        Ok(total / neighbors.len() as f64)
    }

    fn search(&self, node: &Node, query: &[f64], k: usize, heap: &mut BinaryHeap<Candidate>) {
        match node {
            Node::Leaf { start, end } => {
                for &index in &self.order[*start..*end] {
                    let candidate = Candidate {
                        dist_sq: squared_euclidean(query, self.points.point(index)),
                        index,
                    };
                    if heap.len() < k {
                        heap.push(candidate);
                    } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                        heap.pop();
                        heap.push(candidate);
                    }
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = query[*axis] - value;
                let (near, far) = if diff <= 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };
                self.search(near, query, k, heap);

                // Ties at the boundary may still win on index, so visit on equality.
                let bound = heap.peek().map_or(f64::INFINITY, |worst| worst.dist_sq);
                if heap.len() < k || diff * diff <= bound {
                    self.search(far, query, k, heap);
                }
            }
        }
    }
}

fn build_node(points: &EmbeddedSeries, order: &mut [usize], start: usize, end: usize) -> Node {
    if end - start <= LEAF_SIZE {
        return Node::Leaf { start, end };
    }

    let slice = &mut order[start..end];
    let axis = widest_axis(points, slice);
    let mid = slice.len() / 2;
    slice.select_nth_unstable_by(mid, |&a, &b| {
        points.point(a)[axis].total_cmp(&points.point(b)[axis])
    });
    let value = points.point(slice[mid])[axis];

    Node::Split {
        axis,
        value,
        left: Box::new(build_node(points, order, start, start + mid)),
        right: Box::new(build_node(points, order, start + mid, end)),
    }
}

/// Axis with the largest spread among `indices`.
fn widest_axis(points: &EmbeddedSeries, indices: &[usize]) -> usize {
    (0..points.dim())
        .map(|axis| {
            let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                let v = points.point(i)[axis];
                (lo.min(v), hi.max(v))
            });
            (axis, hi - lo)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map_or(0, |(axis, _)| axis)
}

/// Heap entry ordered by `(distance, index)`; the heap top is the worst kept.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist_sq: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.index.cmp(&other.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(points: &[[f64; 2]]) -> EmbeddedSeries {
        EmbeddedSeries::from_flat(points.iter().flatten().copied().collect(), 2).unwrap()
    }

    /// Deterministic pseudo-random cloud (LCG) for comparing against a scan.
    fn cloud(n: usize, dim: usize, seed: u64) -> EmbeddedSeries {
        let mut state = seed;
        let data = (0..n * dim)
            .map(|_| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                ((state >> 33) % 1000) as f64 / 100.0
            })
            .collect();
        EmbeddedSeries::from_flat(data, dim).unwrap()
    }

    fn linear_scan(points: &EmbeddedSeries, query: &[f64], k: usize) -> Vec<(usize, f64)> {
        let mut all: Vec<(usize, f64)> = points
            .points()
            .enumerate()
            .map(|(i, p)| (i, squared_euclidean(query, p)))
            .collect();
        all.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        all.truncate(k);
        all.into_iter().map(|(i, d)| (i, d.sqrt())).collect()
    }

    #[test]
    fn test_small_set_ordering() {
        let index = NeighborIndex::build(series(&[[0.0, 0.0], [3.0, 4.0], [1.0, 0.0]]));
        let result = index.nearest(&[0.0, 0.0], 3).unwrap();
        let indices: Vec<usize> = result.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 2, 1]);
        assert_relative_eq!(result[2].distance, 5.0);
    }

    #[test]
    fn test_ties_break_by_reference_order() {
        let index = NeighborIndex::build(series(&[
            [1.0, 0.0],
            [-1.0, 0.0],
            [0.0, 1.0],
            [0.0, -1.0],
        ]));
        let result = index.nearest(&[0.0, 0.0], 2).unwrap();
        assert_eq!(result[0].index, 0);
        assert_eq!(result[1].index, 1);
    }

    #[test]
    fn test_ties_across_leaves() {
        // Many duplicates force the equal points into different leaves.
        let points = vec![[2.0, 2.0]; 100];
        let index = NeighborIndex::build(series(&points));
        let result = index.nearest(&[2.0, 2.0], 5).unwrap();
        let indices: Vec<usize> = result.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_matches_linear_scan() {
        for dim in [1, 2, 5] {
            let points = cloud(500, dim, 7 + dim as u64);
            let queries = cloud(40, dim, 99);
            let index = NeighborIndex::build(points.clone());

            for query in queries.points() {
                for k in [1, 3, 10] {
                    let expected = linear_scan(&points, query, k);
                    let got = index.nearest(query, k).unwrap();
                    assert_eq!(got.len(), expected.len());
                    for (g, (i, d)) in got.iter().zip(expected.iter()) {
                        assert_eq!(g.index, *i);
                        assert_relative_eq!(g.distance, *d, epsilon = 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_repeated_queries_identical() {
        let index = NeighborIndex::build(cloud(200, 3, 1));
        let query = [4.0, 5.0, 6.0];
        let first = index.nearest(&query, 7).unwrap();
        for _ in 0..5 {
            assert_eq!(index.nearest(&query, 7).unwrap(), first);
        }
    }

    #[test]
    fn test_k_capped_at_reference_size() {
        let index = NeighborIndex::build(series(&[[0.0, 0.0], [1.0, 1.0]]));
        assert_eq!(index.nearest(&[0.0, 0.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn test_mean_distance() {
        let index = NeighborIndex::build(series(&[[0.0, 0.0], [3.0, 4.0], [0.0, 1.0]]));
        assert_relative_eq!(index.mean_distance(&[0.0, 0.0], 1).unwrap(), 0.0);
        assert_relative_eq!(index.mean_distance(&[0.0, 0.0], 2).unwrap(), 0.5);
        assert_relative_eq!(index.mean_distance(&[0.0, 0.0], 3).unwrap(), 2.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let index = NeighborIndex::build(series(&[[0.0, 0.0]]));
        assert!(matches!(
            index.nearest(&[0.0], 1),
            Err(ClassifierError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_empty_index() {
        let index = NeighborIndex::build(EmbeddedSeries::from_flat(Vec::new(), 2).unwrap());
        assert!(index.is_empty());
        assert!(index.nearest(&[0.0, 0.0], 3).unwrap().is_empty());
        assert!(index.mean_distance(&[0.0, 0.0], 3).unwrap().is_infinite());
    }
}
