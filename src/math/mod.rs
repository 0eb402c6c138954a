//! Mathematical utilities for embedded trajectories.
//!
//! This module provides:
//! - [`linalg`]: PCA projection and Euclidean distances

pub mod linalg;

pub use linalg::{euclidean, squared_euclidean, PcaBasis, PcaSpec};
