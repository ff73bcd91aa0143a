//! The `my_own` backend: a full query × train distance matrix followed by a
//! partial selection of the k smallest entries per row.
//!
//! Peak memory is `O(query_rows × train_rows)`, which is what the batching
//! layer exists to bound.

use std::cmp::Ordering;

use ndarray::{Array2, ArrayView2};
use ordered_float::OrderedFloat;

use super::{Feature, Metric, NeighborSearch, Neighbors, validate_query, validate_training};
use crate::error::KnnError;

#[derive(Debug, Clone)]
pub struct PairwiseFinder<F> {
    n_neighbors: usize,
    metric: Metric,
    points: Option<Array2<F>>,
}

impl<F: Feature> PairwiseFinder<F> {
    pub fn new(n_neighbors: usize, metric: Metric) -> Self {
        Self {
            n_neighbors,
            metric,
            points: None,
        }
    }

    /// Distances from every query row to every fitted row.
    pub fn distance_matrix(&self, query: ArrayView2<'_, F>) -> Result<Array2<f64>, KnnError> {
        let points = self.points.as_ref().ok_or(KnnError::NotFitted)?;
        Ok(pairwise_distances(self.metric, query, points.view()))
    }
}

pub fn pairwise_distances<F: Feature>(
    metric: Metric,
    query: ArrayView2<'_, F>,
    points: ArrayView2<'_, F>,
) -> Array2<f64> {
    Array2::from_shape_fn((query.nrows(), points.nrows()), |(i, j)| {
        metric.distance(query.row(i), points.row(j))
    })
}

/// Positions of the `k` smallest values of `row`, nearest first. Equal
/// values are ordered by position.
pub fn best_ranks(row: &[f64], k: usize) -> Vec<(f64, usize)> {
    let by_rank = |a: &(f64, usize), b: &(f64, usize)| -> Ordering {
        OrderedFloat(a.0)
            .cmp(&OrderedFloat(b.0))
            .then_with(|| a.1.cmp(&b.1))
    };

    if k == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<(f64, usize)> = row.iter().copied().zip(0..).collect();
    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, by_rank);
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(by_rank);
    ranked
}

impl<F: Feature> NeighborSearch<F> for PairwiseFinder<F> {
    fn fit(&mut self, points: ArrayView2<'_, F>) -> Result<(), KnnError> {
        validate_training(points)?;
        self.points = Some(points.to_owned());
        Ok(())
    }

    fn kneighbors(&self, query: ArrayView2<'_, F>) -> Result<Neighbors, KnnError> {
        let points = self.points.as_ref().ok_or(KnnError::NotFitted)?;
        validate_query(query, points.ncols(), points.nrows(), self.n_neighbors)?;

        let distances = pairwise_distances(self.metric, query, points.view());
        let rows = distances
            .rows()
            .into_iter()
            .map(|row| best_ranks(&row.to_vec(), self.n_neighbors))
            .collect();
        Ok(Neighbors::from_sorted_rows(self.n_neighbors, rows))
    }

    fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    fn n_samples_fit(&self) -> Option<usize> {
        self.points.as_ref().map(|points| points.nrows())
    }
}
