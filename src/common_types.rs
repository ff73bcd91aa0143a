//! Row storage shared by the tree indexes, and nested-row conversion.

use ndarray::{Array2, ArrayView2};

use crate::error::KnnError;

/// One fitted reference point: its features plus its row in the training matrix.
///
/// - `F`: The type of the features (e.g., `f64`, `f32`).
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint<F> {
    pub features: Vec<F>,
    pub index: usize,
}

impl<F: Copy> DataPoint<F> {
    pub fn new(features: Vec<F>, index: usize) -> Self {
        DataPoint { features, index }
    }

    /// One point per matrix row, indexed by row position.
    pub fn from_rows(points: ArrayView2<'_, F>) -> Vec<Self> {
        points
            .rows()
            .into_iter()
            .enumerate()
            .map(|(index, row)| DataPoint::new(row.to_vec(), index))
            .collect()
    }
}

/// Rows of equal length into a matrix.
///
/// An empty `rows` gives a `(0, width_if_empty)` matrix, so an empty query
/// can still carry the fitted width.
pub fn rows_to_matrix<F: Copy>(
    rows: &[Vec<F>],
    width_if_empty: usize,
) -> Result<Array2<F>, KnnError> {
    let width = rows.first().map_or(width_if_empty, Vec::len);
    if let Some(row) = rows.iter().position(|r| r.len() != width) {
        return Err(KnnError::RaggedRows {
            row,
            len: rows[row].len(),
            expected: width,
        });
    }
    Ok(Array2::from_shape_fn((rows.len(), width), |(i, j)| rows[i][j]))
}
