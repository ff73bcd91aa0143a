//! The KNN classifier: a neighbor search plus a voting scheme.

use std::collections::BTreeSet;
use std::marker::PhantomData;

use ndarray::{Array1, Array2, ArrayView2};
use tracing::debug;

use crate::config::{KnnConfig, Weighting};
use crate::error::KnnError;
use crate::knn::batched::BatchedSearch;
use crate::knn::finder::Finder;
use crate::knn::{Feature, NeighborSearch, Neighbors};
use crate::vote;

/// k-nearest-neighbor classifier over features `F` and labels `L`.
///
/// `S` is the neighbor search. The default is [`Finder`], the backend
/// chosen by name; [`BatchedKnnClassifier`] wraps it in a
/// [`BatchedSearch`]. Any other [`NeighborSearch`] can be plugged in with
/// [`KnnClassifier::with_search`].
///
/// Predictions are class codes: positions in [`KnnClassifier::classes`],
/// the sorted distinct labels seen by the last `fit`.
#[derive(Debug)]
pub struct KnnClassifier<F, L, S = Finder<F>> {
    search: S,
    weighting: Weighting,
    classes: Vec<L>,
    label_codes: Vec<usize>,
    n_features: usize,
    _features: PhantomData<fn() -> F>,
}

/// A [`KnnClassifier`] that searches large query sets in bounded chunks.
pub type BatchedKnnClassifier<F, L> = KnnClassifier<F, L, BatchedSearch<Finder<F>>>;

impl<F: Feature, L: Ord + Clone> KnnClassifier<F, L> {
    /// Builds a classifier from a configuration. The batch size, if any, is
    /// ignored; use [`BatchedKnnClassifier::batched`] for batching.
    pub fn new(config: &KnnConfig) -> Result<Self, KnnError> {
        config.validate()?;
        let search = Finder::new(config.n_neighbors(), config.backend(), config.metric())?;
        Ok(Self::with_search(search, config.weighting()))
    }

    /// Builds a classifier from backend, metric and weighting names.
    ///
    /// ```
    /// use batched_knn::{KnnClassifier, KnnError};
    ///
    /// let err = KnnClassifier::<f64, u8>::from_names(3, "kd_tree", "euclidean", "linear")
    ///     .unwrap_err();
    /// assert!(matches!(err, KnnError::UnsupportedWeighting { .. }));
    /// ```
    pub fn from_names(
        n_neighbors: usize,
        backend: &str,
        metric: &str,
        weighting: &str,
    ) -> Result<Self, KnnError> {
        Self::new(&config_from_names(n_neighbors, backend, metric, weighting)?)
    }
}

impl<F: Feature, L: Ord + Clone> KnnClassifier<F, L, BatchedSearch<Finder<F>>> {
    /// Builds a batched classifier; the batch size comes from
    /// [`KnnConfig::with_batch_size`].
    pub fn batched(config: &KnnConfig) -> Result<Self, KnnError> {
        config.validate()?;
        let finder = Finder::new(config.n_neighbors(), config.backend(), config.metric())?;
        let search = BatchedSearch::new(finder, config.batch_size())?;
        Ok(Self::with_search(search, config.weighting()))
    }

    pub fn batched_from_names(
        n_neighbors: usize,
        backend: &str,
        metric: &str,
        weighting: &str,
        batch_size: Option<usize>,
    ) -> Result<Self, KnnError> {
        let config =
            config_from_names(n_neighbors, backend, metric, weighting)?.with_batch_size(batch_size);
        Self::batched(&config)
    }
}

fn config_from_names(
    n_neighbors: usize,
    backend: &str,
    metric: &str,
    weighting: &str,
) -> Result<KnnConfig, KnnError> {
    Ok(KnnConfig::new(n_neighbors)
        .with_backend(backend.parse()?)
        .with_metric(metric.parse()?)
        .with_weighting(weighting.parse()?))
}

impl<F: Feature, L: Ord + Clone, S: NeighborSearch<F>> KnnClassifier<F, L, S> {
    /// Wraps an arbitrary neighbor search.
    pub fn with_search(search: S, weighting: Weighting) -> Self {
        Self {
            search,
            weighting,
            classes: Vec::new(),
            label_codes: Vec::new(),
            n_features: 0,
            _features: PhantomData,
        }
    }

    /// Indexes `x` and stores `y`, replacing any previous fit.
    ///
    /// # Errors
    ///
    /// [`KnnError::LabelCountMismatch`] if `y` and `x` differ in length,
    /// plus whatever the search backend rejects. On error the previous fit
    /// is kept.
    #[tracing::instrument(skip_all, fields(samples = x.nrows(), features = x.ncols()))]
    pub fn fit(&mut self, x: ArrayView2<'_, F>, y: &[L]) -> Result<&mut Self, KnnError> {
        if y.len() != x.nrows() {
            return Err(KnnError::LabelCountMismatch {
                labels: y.len(),
                samples: x.nrows(),
            });
        }
        self.search.fit(x)?;

        let classes: Vec<L> = y.iter().collect::<BTreeSet<_>>().into_iter().cloned().collect();
        self.label_codes = y
            .iter()
            .map(|label| classes.partition_point(|class| class < label))
            .collect();
        self.classes = classes;
        self.n_features = x.ncols();

        debug!(classes = self.classes.len(), "fitted");
        Ok(self)
    }

    /// Sorted distinct labels from the last `fit`; empty before `fit`.
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }

    /// Column count of the last `fit`; `None` before `fit`.
    pub fn n_features(&self) -> Option<usize> {
        self.is_fitted().then_some(self.n_features)
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn n_neighbors(&self) -> usize {
        self.search.n_neighbors()
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    /// Distances and indices of the `k` nearest training rows per query row.
    pub fn kneighbors(&self, x: ArrayView2<'_, F>) -> Result<Neighbors, KnnError> {
        self.ensure_fitted()?;
        self.search.kneighbors(x)
    }

    /// Indices of the `k` nearest training rows per query row.
    pub fn kneighbor_indices(&self, x: ArrayView2<'_, F>) -> Result<Array2<usize>, KnnError> {
        self.ensure_fitted()?;
        self.search.kneighbor_indices(x)
    }

    /// Predicted class code (index into [`KnnClassifier::classes`]) per row.
    #[tracing::instrument(skip_all, fields(queries = x.nrows()))]
    pub fn predict(&self, x: ArrayView2<'_, F>) -> Result<Array1<usize>, KnnError> {
        let neighbors = self.kneighbors(x)?;
        self.predict_precomputed(&neighbors)
    }

    /// Votes over neighbors that were already searched.
    pub fn predict_precomputed(&self, neighbors: &Neighbors) -> Result<Array1<usize>, KnnError> {
        self.ensure_fitted()?;
        vote::vote(
            &self.label_codes,
            self.classes.len(),
            neighbors,
            self.weighting,
        )
    }

    /// Predicted label value per row.
    pub fn predict_labels(&self, x: ArrayView2<'_, F>) -> Result<Vec<L>, KnnError> {
        let codes = self.predict(x)?;
        Ok(codes.iter().map(|&code| self.classes[code].clone()).collect())
    }

    fn ensure_fitted(&self) -> Result<(), KnnError> {
        if self.is_fitted() {
            Ok(())
        } else {
            Err(KnnError::NotFitted)
        }
    }
}
