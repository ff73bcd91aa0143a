//! Memory-bounded neighbor search over large query sets.
//!
//! [`BatchedSearch`] wraps any [`NeighborSearch`] and feeds it the query
//! rows in chunks of at most `batch_size`, then stacks the partial results
//! in chunk order. The stacked result is row-for-row the result of a
//! single unbatched call; only peak memory and the number of backend calls
//! change.

use std::ops::Range;

use ndarray::{ArrayView2, s};
use tracing::debug;

use super::{Feature, NeighborSearch, Neighbors};
use crate::error::KnnError;

/// Splits `n` rows into `sections` contiguous ranges whose sizes differ by
/// at most one; the first `n % sections` ranges take the extra row.
///
/// `sections` is clamped to `1..=n`, so no range is empty unless `n == 0`,
/// which yields no ranges at all.
pub fn even_split(n: usize, sections: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let sections = sections.clamp(1, n);
    let (base, extra) = (n / sections, n % sections);

    let mut ranges = Vec::with_capacity(sections);
    let mut start = 0;
    for i in 0..sections {
        let len = base + usize::from(i < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}

/// Chunk plan for `n` query rows under `batch_size`: `floor(n / b) + 1`
/// even sections. Every chunk holds at most `batch_size` rows.
pub fn chunk_plan(n: usize, batch_size: usize) -> Vec<Range<usize>> {
    even_split(n, n / batch_size + 1)
}

/// A [`NeighborSearch`] that queries its inner search chunk by chunk.
#[derive(Debug)]
pub struct BatchedSearch<S> {
    inner: S,
    batch_size: Option<usize>,
}

impl<S> BatchedSearch<S> {
    /// `batch_size = None` disables batching.
    pub fn new(inner: S, batch_size: Option<usize>) -> Result<Self, KnnError> {
        if batch_size == Some(0) {
            return Err(KnnError::InvalidBatchSize { batch_size: 0 });
        }
        Ok(Self { inner, batch_size })
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.batch_size
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<F: Feature, S: NeighborSearch<F>> NeighborSearch<F> for BatchedSearch<S> {
    fn fit(&mut self, points: ArrayView2<'_, F>) -> Result<(), KnnError> {
        self.inner.fit(points)
    }

    /// Always computes distances, even when only indices are wanted, so the
    /// voting layer sees one shape regardless of batching.
    fn kneighbors(&self, query: ArrayView2<'_, F>) -> Result<Neighbors, KnnError> {
        let n = query.nrows();
        let batch_size = match self.batch_size {
            Some(batch_size) if batch_size < n => batch_size,
            _ => return self.inner.kneighbors(query),
        };

        let plan = chunk_plan(n, batch_size);
        debug!(rows = n, batch_size, chunks = plan.len(), "batched neighbor search");

        let mut parts = Vec::with_capacity(plan.len());
        for (chunk, rows) in plan.into_iter().enumerate() {
            debug!(chunk, start = rows.start, end = rows.end, "searching chunk");
            parts.push(self.inner.kneighbors(query.slice(s![rows, ..]))?);
        }
        Ok(Neighbors::concatenate(self.inner.n_neighbors(), &parts))
    }

    fn n_neighbors(&self) -> usize {
        self.inner.n_neighbors()
    }

    fn n_samples_fit(&self) -> Option<usize> {
        self.inner.n_samples_fit()
    }
}
