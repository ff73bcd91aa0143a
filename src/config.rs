//! Construction-time configuration for the classifier and its search backend.

use std::fmt;
use std::str::FromStr;

use crate::error::KnnError;
use crate::knn::Metric;

/// Which neighbor-search implementation backs the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum BackendKind {
    /// Pairwise distance matrix with per-row partial selection (`my_own`).
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "my_own"))]
    Custom,
    /// Per-query bounded-heap scan (`brute`).
    Brute,
    /// k-d tree (`kd_tree`).
    KdTree,
    /// Ball tree (`ball_tree`).
    BallTree,
    /// Chosen from the training data at fit time (`auto`).
    Auto,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Custom,
        BackendKind::Brute,
        BackendKind::KdTree,
        BackendKind::BallTree,
        BackendKind::Auto,
    ];

    /// The configuration name of this backend.
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Custom => "my_own",
            BackendKind::Brute => "brute",
            BackendKind::KdTree => "kd_tree",
            BackendKind::BallTree => "ball_tree",
            BackendKind::Auto => "auto",
        }
    }

    /// Tree indexes prune with the triangle inequality and reject cosine.
    pub fn supports(&self, metric: &Metric) -> bool {
        match self {
            BackendKind::KdTree | BackendKind::BallTree => metric.is_true_metric(),
            BackendKind::Custom | BackendKind::Brute | BackendKind::Auto => true,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = KnnError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| KnnError::UnsupportedBackend {
                name: name.to_string(),
            })
    }
}

/// How neighbor votes are aggregated per class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Weighting {
    /// Every neighbor casts one vote.
    #[default]
    Uniform,
    /// Every neighbor casts `1 / distance`; a zero distance casts nothing.
    Distance,
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weighting::Uniform => f.write_str("uniform"),
            Weighting::Distance => f.write_str("distance"),
        }
    }
}

impl FromStr for Weighting {
    type Err = KnnError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "uniform" => Ok(Weighting::Uniform),
            "distance" => Ok(Weighting::Distance),
            _ => Err(KnnError::UnsupportedWeighting {
                name: name.to_string(),
            }),
        }
    }
}

/// Configuration for a KNN classifier.
///
/// Use the builder methods to customise parameters.
///
/// # Example
///
/// ```
/// use batched_knn::{BackendKind, KnnConfig, Metric, Weighting};
///
/// let config = KnnConfig::new(5)
///     .with_backend(BackendKind::KdTree)
///     .with_metric(Metric::Manhattan)
///     .with_weighting(Weighting::Distance)
///     .with_batch_size(Some(256));
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnnConfig {
    /// Number of neighbors consulted per query.
    n_neighbors: usize,
    /// Neighbor-search implementation.
    backend: BackendKind,
    /// Distance metric handed to the backend.
    metric: Metric,
    /// Vote aggregation scheme.
    weighting: Weighting,
    /// Upper bound on query rows per backend call; `None` disables batching.
    batch_size: Option<usize>,
}

impl KnnConfig {
    /// Creates a new configuration with the given neighbor count.
    ///
    /// Defaults: backend `my_own`, metric `euclidean`, weighting `uniform`, no batching.
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors,
            backend: BackendKind::Custom,
            metric: Metric::Euclidean,
            weighting: Weighting::Uniform,
            batch_size: None,
        }
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Sets the batch size used by the batched classifier.
    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.batch_size
    }

    /// Validates this configuration.
    ///
    /// Checked in order: neighbor count, metric parameters, backend/metric
    /// compatibility, batch size.
    pub fn validate(&self) -> Result<(), KnnError> {
        if self.n_neighbors < 1 {
            return Err(KnnError::InvalidNeighborCount {
                k: self.n_neighbors,
            });
        }
        self.metric.validate()?;
        if !self.backend.supports(&self.metric) {
            return Err(KnnError::IncompatibleMetric {
                backend: self.backend,
                metric: self.metric,
            });
        }
        if self.batch_size == Some(0) {
            return Err(KnnError::InvalidBatchSize { batch_size: 0 });
        }
        Ok(())
    }
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self::new(5)
    }
}
