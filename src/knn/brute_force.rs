//! Exhaustive search: every query is compared with every fitted row.

use ndarray::{Array2, ArrayView2};

use super::heap_utils::KBestNeighbors;
use super::{Feature, Metric, NeighborSearch, Neighbors, validate_query, validate_training};
use crate::error::KnnError;

/// Brute-force backend (`brute`). Memory per query is `O(k)`.
#[derive(Debug, Clone)]
pub struct BruteForce<F> {
    n_neighbors: usize,
    metric: Metric,
    points: Option<Array2<F>>,
}

impl<F: Feature> BruteForce<F> {
    pub fn new(n_neighbors: usize, metric: Metric) -> Self {
        Self {
            n_neighbors,
            metric,
            points: None,
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }
}

impl<F: Feature> NeighborSearch<F> for BruteForce<F> {
    fn fit(&mut self, points: ArrayView2<'_, F>) -> Result<(), KnnError> {
        validate_training(points)?;
        self.points = Some(points.to_owned());
        Ok(())
    }

    fn kneighbors(&self, query: ArrayView2<'_, F>) -> Result<Neighbors, KnnError> {
        let points = self.points.as_ref().ok_or(KnnError::NotFitted)?;
        validate_query(query, points.ncols(), points.nrows(), self.n_neighbors)?;

        let rows = query
            .rows()
            .into_iter()
            .map(|target| {
                let mut best_k = KBestNeighbors::new(self.n_neighbors);
                for (index, train) in points.rows().into_iter().enumerate() {
                    best_k.add(self.metric.distance(target, train), index);
                }
                best_k.into_sorted()
            })
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
