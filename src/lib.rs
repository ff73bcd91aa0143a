//! K-nearest-neighbor classification with pluggable search backends and
//! batched inference.
//!
//! Neighbor search is a capability ([`NeighborSearch`]) with several
//! concrete backends, selected by name:
//!
//! | Backend | Search | Metrics |
//! |---------|--------|---------|
//! | `my_own` | Pairwise distance matrix, partial selection per row | all |
//! | `brute` | Bounded heap per query | all |
//! | `kd_tree` | Median-split k-d tree | euclidean, manhattan, minkowski |
//! | `ball_tree` | Variance-split ball tree | euclidean, manhattan, minkowski |
//! | `auto` | One of the above, chosen from the training shape | all |
//!
//! Votes are either `uniform` (one per neighbor) or `distance` (`1 / d`,
//! with zero distances casting nothing). Exact vote ties go to the class
//! that sorts first.
//!
//! # Quick start
//!
//! ```
//! use batched_knn::{BackendKind, BatchedKnnClassifier, KnnConfig, Weighting};
//! use ndarray::array;
//!
//! let x = array![[0.0, 0.0], [0.2, 0.1], [5.0, 5.0], [5.1, 4.8]];
//! let y = ["cold", "cold", "hot", "hot"];
//! let config = KnnConfig::new(2)
//!     .with_backend(BackendKind::KdTree)
//!     .with_weighting(Weighting::Distance)
//!     .with_batch_size(Some(1));
//!
//! let mut clf = BatchedKnnClassifier::<f64, &str>::batched(&config).unwrap();
//! clf.fit(x.view(), &y).unwrap();
//!
//! let query = array![[0.1, 0.1], [4.9, 5.0]];
//! assert_eq!(clf.predict(query.view()).unwrap(), array![0, 1]);
//! assert_eq!(clf.predict_labels(query.view()).unwrap(), vec!["cold", "hot"]);
//! ```
//!
//! # Architecture
//!
//! ```text
//! KnnClassifier::predict()
//!   ├─ NeighborSearch::kneighbors()
//!   │    ├─ BatchedSearch        (knn/batched.rs, optional)
//!   │    └─ Finder               (knn/finder.rs)
//!   │         └─ pairwise | brute_force | kd_tree | ball_tree
//!   └─ vote()                    (vote.rs)
//! ```

pub mod classifier;
pub mod common_types;
pub mod config;
pub mod error;
pub mod knn;
pub mod vote;

#[cfg(feature = "python")]
mod python;

pub use classifier::{BatchedKnnClassifier, KnnClassifier};
pub use config::{BackendKind, KnnConfig, Weighting};
pub use error::{ErrorKind, KnnError};
pub use knn::batched::BatchedSearch;
pub use knn::finder::Finder;
pub use knn::{Feature, Metric, NeighborSearch, Neighbors};
