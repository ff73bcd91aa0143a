//! Turning neighbor lists into class predictions.
//!
//! Labels are handled as codes: positions in the sorted distinct-label
//! vocabulary built at fit time. A vote matrix has one row per query and
//! one column per code, so the winning column of a row is directly the
//! predicted code.

use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::config::Weighting;
use crate::error::KnnError;
use crate::knn::Neighbors;

/// `1 / distance`, or 0 when the reciprocal is not finite (zero distance).
pub fn inverse_distance(distance: f64) -> f64 {
    let weight = distance.recip();
    if weight.is_finite() { weight } else { 0.0 }
}

/// Aggregated vote weight per (query, class code).
///
/// `label_codes[i]` is the class code of fitted row `i`. Neighbor indices
/// outside `label_codes` and codes not below `n_classes` are rejected
/// rather than skipped.
pub fn vote_matrix(
    label_codes: &[usize],
    n_classes: usize,
    neighbors: &Neighbors,
    weighting: Weighting,
) -> Result<Array2<f64>, KnnError> {
    let mut votes = Array2::zeros((neighbors.n_queries(), n_classes));
    let rows = neighbors
        .indices()
        .outer_iter()
        .zip(neighbors.distances().outer_iter());

    for (mut tally, (indices, distances)) in votes.outer_iter_mut().zip(rows) {
        for (&index, &distance) in indices.iter().zip(distances.iter()) {
            let code = *label_codes.get(index).ok_or(KnnError::IndexOutOfRange {
                index,
                samples: label_codes.len(),
            })?;
            let slot = tally.get_mut(code).ok_or(KnnError::ClassCodeOutOfRange {
                code,
                classes: n_classes,
            })?;
            *slot += match weighting {
                Weighting::Uniform => 1.0,
                Weighting::Distance => inverse_distance(distance),
            };
        }
    }
    Ok(votes)
}

/// Position of the first maximum; earlier columns win exact ties.
pub fn argmax_first(row: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (column, &weight) in row.iter().enumerate().skip(1) {
        if weight > row[best] {
            best = column;
        }
    }
    best
}

/// Winning class code for every query row.
pub fn vote(
    label_codes: &[usize],
    n_classes: usize,
    neighbors: &Neighbors,
    weighting: Weighting,
) -> Result<Array1<usize>, KnnError> {
    let votes = vote_matrix(label_codes, n_classes, neighbors, weighting)?;
    Ok(votes.map_axis(Axis(1), argmax_first))
}
