//! [`Finder`]: the backend selected by name at construction time.

use ndarray::{Array2, ArrayView2};
use tracing::debug;

use super::ball_tree::BallTreeFinder;
use super::brute_force::BruteForce;
use super::kd_tree::KdTreeFinder;
use super::pairwise::PairwiseFinder;
use super::{Feature, Metric, NeighborSearch, Neighbors};
use crate::config::BackendKind;
use crate::error::KnnError;

/// A concrete search backend.
#[derive(Debug)]
pub enum Backend<F> {
    Pairwise(PairwiseFinder<F>),
    Brute(BruteForce<F>),
    KdTree(KdTreeFinder<F>),
    BallTree(BallTreeFinder<F>),
}

impl<F: Feature> Backend<F> {
    fn as_search(&self) -> &dyn NeighborSearch<F> {
        match self {
            Backend::Pairwise(b) => b,
            Backend::Brute(b) => b,
            Backend::KdTree(b) => b,
            Backend::BallTree(b) => b,
        }
    }

    fn as_search_mut(&mut self) -> &mut dyn NeighborSearch<F> {
        match self {
            Backend::Pairwise(b) => b,
            Backend::Brute(b) => b,
            Backend::KdTree(b) => b,
            Backend::BallTree(b) => b,
        }
    }
}

/// Neighbor search selected by [`BackendKind`] and [`Metric`].
///
/// The concrete backend is built at `fit`, which is also where
/// [`BackendKind::Auto`] is resolved.
#[derive(Debug)]
pub struct Finder<F> {
    requested: BackendKind,
    n_neighbors: usize,
    metric: Metric,
    backend: Option<Backend<F>>,
}

impl<F: Feature> Finder<F> {
    // Thresholds for `auto` resolution
    pub const N_THRESHOLD_FOR_BRUTE_FORCE: usize = 1000; // If N < this, use brute force
    pub const K_DIMENSIONS_THRESHOLD_FOR_KD_VS_BALL: usize = 20; // If dims < this, prefer the k-d tree

    /// Validates the combination eagerly; no data is needed.
    pub fn new(n_neighbors: usize, backend: BackendKind, metric: Metric) -> Result<Self, KnnError> {
        if n_neighbors < 1 {
            return Err(KnnError::InvalidNeighborCount { k: n_neighbors });
        }
        metric.validate()?;
        if !backend.supports(&metric) {
            return Err(KnnError::IncompatibleMetric { backend, metric });
        }
        Ok(Self {
            requested: backend,
            n_neighbors,
            metric,
            backend: None,
        })
    }

    /// The backend named at construction (possibly `Auto`).
    pub fn requested(&self) -> BackendKind {
        self.requested
    }

    /// The backend actually in use, once fitted.
    pub fn resolved(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(|backend| match backend {
            Backend::Pairwise(_) => BackendKind::Custom,
            Backend::Brute(_) => BackendKind::Brute,
            Backend::KdTree(_) => BackendKind::KdTree,
            Backend::BallTree(_) => BackendKind::BallTree,
        })
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Picks a concrete backend for `Auto` from the training shape.
    pub fn resolve_auto(metric: Metric, n_points: usize, k_dimensions: usize) -> BackendKind {
        if n_points < Self::N_THRESHOLD_FOR_BRUTE_FORCE || !metric.is_true_metric() {
            BackendKind::Brute
        } else if k_dimensions < Self::K_DIMENSIONS_THRESHOLD_FOR_KD_VS_BALL {
            BackendKind::KdTree
        } else {
            BackendKind::BallTree
        }
    }

    fn build(&self, kind: BackendKind) -> Backend<F> {
        let (k, metric) = (self.n_neighbors, self.metric);
        match kind {
            BackendKind::Custom => Backend::Pairwise(PairwiseFinder::new(k, metric)),
            BackendKind::Brute | BackendKind::Auto => Backend::Brute(BruteForce::new(k, metric)),
            BackendKind::KdTree => Backend::KdTree(KdTreeFinder::new(k, metric)),
            BackendKind::BallTree => Backend::BallTree(BallTreeFinder::new(k, metric)),
        }
    }
}

impl<F: Feature> NeighborSearch<F> for Finder<F> {
    fn fit(&mut self, points: ArrayView2<'_, F>) -> Result<(), KnnError> {
        let kind = match self.requested {
            BackendKind::Auto => {
                let kind = Self::resolve_auto(self.metric, points.nrows(), points.ncols());
                debug!(backend = %kind, samples = points.nrows(), features = points.ncols(), "auto backend resolved");
                kind
            }
            kind => kind,
        };
        let mut backend = self.build(kind);
        backend.as_search_mut().fit(points)?;
        self.backend = Some(backend);
        Ok(())
    }

    fn kneighbors(&self, query: ArrayView2<'_, F>) -> Result<Neighbors, KnnError> {
        self.backend
            .as_ref()
            .ok_or(KnnError::NotFitted)?
            .as_search()
            .kneighbors(query)
    }

    fn kneighbor_indices(&self, query: ArrayView2<'_, F>) -> Result<Array2<usize>, KnnError> {
        self.backend
            .as_ref()
            .ok_or(KnnError::NotFitted)?
            .as_search()
            .kneighbor_indices(query)
    }

    fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    fn n_samples_fit(&self) -> Option<usize> {
        self.backend
            .as_ref()
            .and_then(|backend| backend.as_search().n_samples_fit())
    }
}
