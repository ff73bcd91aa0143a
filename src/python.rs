use ndarray::Array2;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::classifier::BatchedKnnClassifier;
use crate::common_types::rows_to_matrix;
use crate::config::KnnConfig;
use crate::error::{ErrorKind, KnnError};

impl From<KnnError> for PyErr {
    fn from(err: KnnError) -> Self {
        match err.kind() {
            ErrorKind::Uninitialized => PyRuntimeError::new_err(err.to_string()),
            ErrorKind::Configuration | ErrorKind::ShapeMismatch => {
                PyValueError::new_err(err.to_string())
            }
        }
    }
}

fn to_rows<T: Clone>(matrix: Array2<T>) -> Vec<Vec<T>> {
    matrix.outer_iter().map(|row| row.to_vec()).collect()
}

/// KNN classifier over string labels, with optional batched inference.
#[pyclass(name = "KnnClassifier")]
struct PyKnnClassifier {
    inner: BatchedKnnClassifier<f64, String>,
}

impl PyKnnClassifier {
    /// Query rows as a matrix. An empty query takes the fitted width, and
    /// before `fit` the core reports the classifier as not fitted.
    fn query_matrix(&self, x: &[Vec<f64>]) -> PyResult<Array2<f64>> {
        Ok(rows_to_matrix(x, self.inner.n_features().unwrap_or(0))?)
    }
}

#[pymethods]
impl PyKnnClassifier {
    #[new]
    #[pyo3(signature = (n_neighbors, algorithm = "my_own", metric = "euclidean", weights = "uniform", batch_size = None))]
    fn new(
        n_neighbors: usize,
        algorithm: &str,
        metric: &str,
        weights: &str,
        batch_size: Option<usize>,
    ) -> PyResult<Self> {
        let config = KnnConfig::new(n_neighbors)
            .with_backend(algorithm.parse()?)
            .with_metric(metric.parse()?)
            .with_weighting(weights.parse()?)
            .with_batch_size(batch_size);
        Ok(PyKnnClassifier {
            inner: BatchedKnnClassifier::batched(&config)?,
        })
    }

    fn fit<'py>(
        mut slf: PyRefMut<'py, Self>,
        x: Vec<Vec<f64>>,
        y: Vec<String>,
    ) -> PyResult<PyRefMut<'py, Self>> {
        let points = rows_to_matrix(&x, 0)?;
        slf.inner.fit(points.view(), &y)?;
        Ok(slf)
    }

    /// Indices of the nearest training rows, plus distances when
    /// `return_distance` is set.
    #[pyo3(signature = (x, return_distance = false))]
    fn kneighbors(&self, py: Python<'_>, x: Vec<Vec<f64>>, return_distance: bool) -> PyResult<PyObject> {
        let query = self.query_matrix(&x)?;
        if return_distance {
            let (distances, indices) = self.inner.kneighbors(query.view())?.into_parts();
            Ok((to_rows(distances), to_rows(indices)).into_py(py))
        } else {
            let indices = self.inner.kneighbor_indices(query.view())?;
            Ok(to_rows(indices).into_py(py))
        }
    }

    /// Class indices into `classes`.
    fn predict(&self, x: Vec<Vec<f64>>) -> PyResult<Vec<usize>> {
        let query = self.query_matrix(&x)?;
        Ok(self.inner.predict(query.view())?.to_vec())
    }

    fn predict_labels(&self, x: Vec<Vec<f64>>) -> PyResult<Vec<String>> {
        let query = self.query_matrix(&x)?;
        Ok(self.inner.predict_labels(query.view())?)
    }

    #[getter]
    fn classes(&self) -> Vec<String> {
        self.inner.classes().to_vec()
    }

    #[getter]
    fn n_neighbors(&self) -> usize {
        self.inner.n_neighbors()
    }
}

/// The `batched_knn` Python module.
#[pymodule]
fn batched_knn(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyKnnClassifier>()?;
    Ok(())
}
