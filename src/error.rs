//! Error types for the batched_knn crate.

use crate::config::BackendKind;
use crate::knn::Metric;

/// Coarse classification of a [`KnnError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad construction-time option. Raised before any data is touched.
    Configuration,
    /// A query-time operation was invoked before `fit`.
    Uninitialized,
    /// Inputs whose shapes disagree with each other or with the fitted state.
    ShapeMismatch,
}

/// Error type for all fallible operations in the batched_knn crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KnnError {
    /// Returned when the backend name is not one of the recognised search strategies.
    #[error("unsupported backend '{name}'")]
    UnsupportedBackend {
        /// The unrecognised backend name.
        name: String,
    },

    /// Returned when the metric name is not recognised.
    #[error("unsupported metric '{name}'")]
    UnsupportedMetric {
        /// The unrecognised metric name.
        name: String,
    },

    /// Returned when the weighting name is neither `uniform` nor `distance`.
    #[error("unsupported weighting '{name}'")]
    UnsupportedWeighting {
        /// The unrecognised weighting name.
        name: String,
    },

    /// Returned when a backend cannot search under the requested metric.
    #[error("backend {backend} does not support metric {metric}")]
    IncompatibleMetric {
        /// The selected backend.
        backend: BackendKind,
        /// The rejected metric.
        metric: Metric,
    },

    /// Returned when the neighbor count is zero.
    #[error("neighbor count must be >= 1, got {k}")]
    InvalidNeighborCount {
        /// The invalid neighbor count.
        k: usize,
    },

    /// Returned when a configured batch size is zero.
    #[error("batch size must be >= 1, got {batch_size}")]
    InvalidBatchSize {
        /// The invalid batch size.
        batch_size: usize,
    },

    /// Returned when the Minkowski power is below 1 or above `i32::MAX`.
    #[error("minkowski power must be in 1..=2147483647, got {p}")]
    InvalidMinkowskiPower {
        /// The invalid power.
        p: u32,
    },

    /// Returned when a query is issued before `fit`.
    #[error("model is not fitted; call fit() first")]
    NotFitted,

    /// Returned when the label array length differs from the training row count.
    #[error("label count {labels} does not match sample count {samples}")]
    LabelCountMismatch {
        /// Number of labels supplied.
        labels: usize,
        /// Number of training rows supplied.
        samples: usize,
    },

    /// Returned when the query width differs from the fitted width.
    #[error("query has {query} features but the index was fitted with {fitted}")]
    DimensionMismatch {
        /// Number of columns in the query.
        query: usize,
        /// Number of columns seen at fit time.
        fitted: usize,
    },

    /// Returned when `fit` receives no rows or zero-width rows.
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// Returned when more neighbors are requested than training rows exist.
    #[error("requested {k} neighbors but only {samples} samples were fitted")]
    TooFewSamples {
        /// The configured neighbor count.
        k: usize,
        /// Number of fitted rows.
        samples: usize,
    },

    /// Returned when an input matrix contains NaN or infinity.
    #[error("non-finite value in {input}")]
    NonFiniteInput {
        /// Name of the input containing the non-finite value.
        input: &'static str,
    },

    /// Returned when a neighbor index points past the fitted labels.
    #[error("neighbor index {index} is out of range for {samples} fitted samples")]
    IndexOutOfRange {
        /// The offending neighbor index.
        index: usize,
        /// Number of fitted labels.
        samples: usize,
    },

    /// Returned when a label code is not below the number of classes.
    #[error("class code {code} is out of range for {classes} classes")]
    ClassCodeOutOfRange {
        /// The offending class code.
        code: usize,
        /// Number of classes voted over.
        classes: usize,
    },

    /// Returned when nested rows do not share one length.
    #[error("row {row} has {len} features, expected {expected}")]
    RaggedRows {
        /// Position of the first mismatching row.
        row: usize,
        /// Its length.
        len: usize,
        /// Length of the first row.
        expected: usize,
    },
}

impl KnnError {
    /// Returns the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KnnError::UnsupportedBackend { .. }
            | KnnError::UnsupportedMetric { .. }
            | KnnError::UnsupportedWeighting { .. }
            | KnnError::IncompatibleMetric { .. }
            | KnnError::InvalidNeighborCount { .. }
            | KnnError::InvalidBatchSize { .. }
            | KnnError::InvalidMinkowskiPower { .. } => ErrorKind::Configuration,
            KnnError::NotFitted => ErrorKind::Uninitialized,
            KnnError::LabelCountMismatch { .. }
            | KnnError::DimensionMismatch { .. }
            | KnnError::EmptyTrainingSet
            | KnnError::TooFewSamples { .. }
            | KnnError::NonFiniteInput { .. }
            | KnnError::IndexOutOfRange { .. }
            | KnnError::ClassCodeOutOfRange { .. }
            | KnnError::RaggedRows { .. } => ErrorKind::ShapeMismatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_unsupported_backend() {
        let e = KnnError::UnsupportedBackend {
            name: "lsh".to_string(),
        };
        assert_eq!(e.to_string(), "unsupported backend 'lsh'");
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn error_unsupported_weighting() {
        let e = KnnError::UnsupportedWeighting {
            name: "gaussian".to_string(),
        };
        assert_eq!(e.to_string(), "unsupported weighting 'gaussian'");
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn error_incompatible_metric() {
        let e = KnnError::IncompatibleMetric {
            backend: BackendKind::KdTree,
            metric: Metric::Cosine,
        };
        assert_eq!(e.to_string(), "backend kd_tree does not support metric cosine");
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn error_invalid_neighbor_count() {
        let e = KnnError::InvalidNeighborCount { k: 0 };
        assert_eq!(e.to_string(), "neighbor count must be >= 1, got 0");
    }

    #[test]
    fn error_not_fitted() {
        let e = KnnError::NotFitted;
        assert_eq!(e.to_string(), "model is not fitted; call fit() first");
        assert_eq!(e.kind(), ErrorKind::Uninitialized);
    }

    #[test]
    fn error_label_count_mismatch() {
        let e = KnnError::LabelCountMismatch {
            labels: 3,
            samples: 4,
        };
        assert_eq!(e.to_string(), "label count 3 does not match sample count 4");
        assert_eq!(e.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn error_dimension_mismatch() {
        let e = KnnError::DimensionMismatch {
            query: 2,
            fitted: 3,
        };
        assert_eq!(
            e.to_string(),
            "query has 2 features but the index was fitted with 3"
        );
        assert_eq!(e.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn error_too_few_samples() {
        let e = KnnError::TooFewSamples { k: 5, samples: 2 };
        assert_eq!(
            e.to_string(),
            "requested 5 neighbors but only 2 samples were fitted"
        );
        assert_eq!(e.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn error_index_out_of_range() {
        let e = KnnError::IndexOutOfRange {
            index: 7,
            samples: 4,
        };
        assert_eq!(
            e.to_string(),
            "neighbor index 7 is out of range for 4 fitted samples"
        );
        assert_eq!(e.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn error_invalid_minkowski_power() {
        let e = KnnError::InvalidMinkowskiPower { p: 0 };
        assert_eq!(e.to_string(), "minkowski power must be in 1..=2147483647, got 0");
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn error_class_code_out_of_range() {
        let e = KnnError::ClassCodeOutOfRange {
            code: 5,
            classes: 2,
        };
        assert_eq!(e.to_string(), "class code 5 is out of range for 2 classes");
        assert_eq!(e.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn error_ragged_rows() {
        let e = KnnError::RaggedRows {
            row: 1,
            len: 3,
            expected: 2,
        };
        assert_eq!(e.to_string(), "row 1 has 3 features, expected 2");
        assert_eq!(e.kind(), ErrorKind::ShapeMismatch);
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<KnnError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<KnnError>();
    }
}
