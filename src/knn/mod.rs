//! Neighbor search: metrics, the backend capability, and its concrete variants.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2, s};
use num_traits::{AsPrimitive, Float};

use crate::error::KnnError;

pub mod ball_tree;
pub mod batched;
pub mod brute_force;
pub mod finder;
pub mod heap_utils;
pub mod kd_tree;
pub mod metric;
pub mod pairwise;

/// Scalar type accepted for feature values. Distances are always reported as `f64`.
pub trait Feature: Float + AsPrimitive<f64> + Send + Sync + fmt::Debug {}

impl<T> Feature for T where T: Float + AsPrimitive<f64> + Send + Sync + fmt::Debug {}

/// Distance metric used by a search backend.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Metric {
    #[default]
    Euclidean,
    Manhattan,
    Minkowski { p: u32 }, // p is the order for Minkowski distance
    Cosine,
}

impl Metric {
    /// Whether the metric satisfies the triangle inequality. Tree indexes
    /// prune with it, so only true metrics can back a tree.
    pub fn is_true_metric(&self) -> bool {
        !matches!(self, Metric::Cosine)
    }

    /// Rejects a Minkowski power below 1 or above `i32::MAX`.
    pub fn validate(&self) -> Result<(), KnnError> {
        match *self {
            Metric::Minkowski { p } if p < 1 || i32::try_from(p).is_err() => {
                Err(KnnError::InvalidMinkowskiPower { p })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Euclidean => f.write_str("euclidean"),
            Metric::Manhattan => f.write_str("manhattan"),
            Metric::Minkowski { p } => write!(f, "minkowski(p={p})"),
            Metric::Cosine => f.write_str("cosine"),
        }
    }
}

impl FromStr for Metric {
    type Err = KnnError;

    /// Parses a metric name. Plain `minkowski` means p = 2.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "euclidean" => Ok(Metric::Euclidean),
            "manhattan" => Ok(Metric::Manhattan),
            "minkowski" => Ok(Metric::Minkowski { p: 2 }),
            "cosine" => Ok(Metric::Cosine),
            _ => Err(KnnError::UnsupportedMetric {
                name: name.to_string(),
            }),
        }
    }
}

/// Result of a k-nearest-neighbor query.
///
/// Row `q` holds the `k` neighbors of query row `q` in ascending distance
/// order. `distances[[q, j]]` and `indices[[q, j]]` describe the same
/// neighbor; indices point into the fitted training rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbors {
    distances: Array2<f64>,
    indices: Array2<usize>,
}

impl Neighbors {
    /// Pairs a distance matrix with its index matrix.
    ///
    /// # Panics
    ///
    /// Panics if the two matrices differ in shape.
    pub fn new(distances: Array2<f64>, indices: Array2<usize>) -> Self {
        assert_eq!(
            distances.dim(),
            indices.dim(),
            "distances and indices must be index-aligned"
        );
        Self { distances, indices }
    }

    /// A result with no query rows.
    pub fn empty(n_neighbors: usize) -> Self {
        Self::new(
            Array2::zeros((0, n_neighbors)),
            Array2::zeros((0, n_neighbors)),
        )
    }

    /// Builds a result from per-query `(distance, index)` lists, each already
    /// sorted and exactly `n_neighbors` long.
    pub(crate) fn from_sorted_rows(n_neighbors: usize, rows: Vec<Vec<(f64, usize)>>) -> Self {
        let mut distances = Array2::zeros((rows.len(), n_neighbors));
        let mut indices = Array2::zeros((rows.len(), n_neighbors));
        for (q, row) in rows.into_iter().enumerate() {
            debug_assert_eq!(row.len(), n_neighbors);
            for (j, (distance, index)) in row.into_iter().enumerate() {
                distances[[q, j]] = distance;
                indices[[q, j]] = index;
            }
        }
        Self { distances, indices }
    }

    /// Stacks partial results along the query axis, in the given order.
    pub fn concatenate(n_neighbors: usize, parts: &[Neighbors]) -> Self {
        let total: usize = parts.iter().map(Neighbors::n_queries).sum();
        let mut distances = Array2::zeros((total, n_neighbors));
        let mut indices = Array2::zeros((total, n_neighbors));
        let mut offset = 0;
        for part in parts {
            let rows = offset..offset + part.n_queries();
            distances
                .slice_mut(s![rows.clone(), ..])
                .assign(&part.distances);
            indices.slice_mut(s![rows, ..]).assign(&part.indices);
            offset += part.n_queries();
        }
        Self { distances, indices }
    }

    pub fn distances(&self) -> &Array2<f64> {
        &self.distances
    }

    pub fn indices(&self) -> &Array2<usize> {
        &self.indices
    }

    /// Number of query rows.
    pub fn n_queries(&self) -> usize {
        self.indices.nrows()
    }

    /// Number of neighbors per query row.
    pub fn n_neighbors(&self) -> usize {
        self.indices.ncols()
    }

    pub fn into_parts(self) -> (Array2<f64>, Array2<usize>) {
        (self.distances, self.indices)
    }

    pub fn into_indices(self) -> Array2<usize> {
        self.indices
    }
}

/// A fitted-or-fittable nearest-neighbor index.
///
/// `kneighbors` corresponds to a query with `return_distance = true`;
/// `kneighbor_indices` to `return_distance = false`.
pub trait NeighborSearch<F: Feature> {
    /// Indexes `points` (one row per reference point), replacing any previous fit.
    fn fit(&mut self, points: ArrayView2<'_, F>) -> Result<(), KnnError>;

    /// Returns the `k` nearest fitted rows for every query row.
    fn kneighbors(&self, query: ArrayView2<'_, F>) -> Result<Neighbors, KnnError>;

    /// Same as [`NeighborSearch::kneighbors`] without the distances.
    fn kneighbor_indices(&self, query: ArrayView2<'_, F>) -> Result<Array2<usize>, KnnError> {
        self.kneighbors(query).map(Neighbors::into_indices)
    }

    /// The configured `k`.
    fn n_neighbors(&self) -> usize;

    /// Number of fitted rows, or `None` before `fit`.
    fn n_samples_fit(&self) -> Option<usize>;
}

/// Checks a training matrix before it is indexed.
pub(crate) fn validate_training<F: Feature>(points: ArrayView2<'_, F>) -> Result<(), KnnError> {
    if points.nrows() == 0 || points.ncols() == 0 {
        return Err(KnnError::EmptyTrainingSet);
    }
    if points.iter().any(|v| !v.is_finite()) {
        return Err(KnnError::NonFiniteInput {
            input: "training points",
        });
    }
    Ok(())
}

/// Checks a query matrix against the fitted shape and `k`.
pub(crate) fn validate_query<F: Feature>(
    query: ArrayView2<'_, F>,
    fitted_dims: usize,
    n_samples: usize,
    n_neighbors: usize,
) -> Result<(), KnnError> {
    if query.ncols() != fitted_dims {
        return Err(KnnError::DimensionMismatch {
            query: query.ncols(),
            fitted: fitted_dims,
        });
    }
    if n_neighbors > n_samples {
        return Err(KnnError::TooFewSamples {
            k: n_neighbors,
            samples: n_samples,
        });
    }
    if query.iter().any(|v| !v.is_finite()) {
        return Err(KnnError::NonFiniteInput { input: "query" });
    }
    Ok(())
}
