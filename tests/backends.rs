//! Every backend answers the same neighbor queries the same way.

use approx::assert_abs_diff_eq;
use batched_knn::{BackendKind, Finder, KnnClassifier, KnnConfig, Metric, NeighborSearch};
use ndarray::{Array2, Axis, array};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EXACT_BACKENDS: [BackendKind; 4] = [
    BackendKind::Custom,
    BackendKind::Brute,
    BackendKind::KdTree,
    BackendKind::BallTree,
];

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0..1.0))
}

/// Two well-separated blobs labelled "left" and "right".
fn blobs(rng: &mut StdRng, per_blob: usize) -> (Array2<f64>, Vec<String>) {
    let mut x = Array2::zeros((2 * per_blob, 2));
    let mut y = Vec::with_capacity(2 * per_blob);
    for (i, mut row) in x.axis_iter_mut(Axis(0)).enumerate() {
        let center = if i < per_blob { -5.0 } else { 5.0 };
        row[0] = center + rng.gen_range(-1.0..1.0);
        row[1] = rng.gen_range(-1.0..1.0);
        y.push(if i < per_blob { "left" } else { "right" }.to_string());
    }
    (x, y)
}

#[test]
fn exact_backends_agree() {
    let mut rng = StdRng::seed_from_u64(17);
    let points = random_matrix(&mut rng, 250, 4);
    let query = random_matrix(&mut rng, 30, 4);

    for metric in [Metric::Euclidean, Metric::Manhattan, Metric::Minkowski { p: 3 }] {
        let mut reference = Finder::new(6, BackendKind::Brute, metric).unwrap();
        reference.fit(points.view()).unwrap();
        let expected = reference.kneighbors(query.view()).unwrap();

        for backend in EXACT_BACKENDS {
            let mut finder = Finder::new(6, backend, metric).unwrap();
            finder.fit(points.view()).unwrap();
            let result = finder.kneighbors(query.view()).unwrap();
            assert_eq!(
                result.indices(),
                expected.indices(),
                "{backend} disagrees under {metric}"
            );
            for (got, want) in result.distances().iter().zip(expected.distances()) {
                assert_abs_diff_eq!(*got, *want, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn cosine_backends_agree() {
    let mut rng = StdRng::seed_from_u64(5);
    let points = random_matrix(&mut rng, 80, 3);
    let query = random_matrix(&mut rng, 12, 3);

    let mut indices = Vec::new();
    for backend in [BackendKind::Custom, BackendKind::Brute, BackendKind::Auto] {
        let mut finder = Finder::new(4, backend, Metric::Cosine).unwrap();
        finder.fit(points.view()).unwrap();
        indices.push(finder.kneighbor_indices(query.view()).unwrap());
    }
    assert_eq!(indices[0], indices[1]);
    assert_eq!(indices[1], indices[2]);
}

#[test]
fn neighbors_are_sorted_and_aligned() {
    let mut rng = StdRng::seed_from_u64(8);
    let points = random_matrix(&mut rng, 100, 2);
    let query = random_matrix(&mut rng, 10, 2);

    for backend in EXACT_BACKENDS {
        let mut finder = Finder::new(5, backend, Metric::Euclidean).unwrap();
        finder.fit(points.view()).unwrap();
        let result = finder.kneighbors(query.view()).unwrap();
        assert_eq!(result.distances().dim(), (10, 5));
        for (q, row) in result.distances().outer_iter().enumerate() {
            for pair in row.as_slice().unwrap().windows(2) {
                assert!(pair[0] <= pair[1], "{backend}: row {q} not ascending");
            }
            for (j, &index) in result.indices().row(q).iter().enumerate() {
                let direct = Metric::Euclidean.distance(query.row(q), points.row(index));
                assert_abs_diff_eq!(result.distances()[[q, j]], direct, epsilon = 1e-12);
            }
        }
    }
}

#[test]
fn every_backend_separates_blobs() {
    let mut rng = StdRng::seed_from_u64(99);
    let (x, y) = blobs(&mut rng, 40);
    let query = array![[-5.2, 0.3], [4.7, -0.6], [-3.9, 0.9], [6.1, 0.0]];

    for backend in BackendKind::ALL {
        for weighting in ["uniform", "distance"] {
            let mut clf =
                KnnClassifier::<f64, String>::from_names(7, backend.name(), "euclidean", weighting)
                    .unwrap();
            clf.fit(x.view(), &y).unwrap();
            assert_eq!(clf.classes(), &["left".to_string(), "right".to_string()]);
            assert_eq!(
                clf.predict_labels(query.view()).unwrap(),
                vec!["left", "right", "left", "right"],
                "{backend}/{weighting}"
            );
        }
    }
}

#[test]
fn auto_picks_tree_for_large_inputs() {
    let mut rng = StdRng::seed_from_u64(1);
    let low_dim = random_matrix(&mut rng, 1200, 3);
    let high_dim = random_matrix(&mut rng, 1200, 24);

    let mut finder = Finder::new(3, BackendKind::Auto, Metric::Euclidean).unwrap();
    finder.fit(low_dim.view()).unwrap();
    assert_eq!(finder.resolved(), Some(BackendKind::KdTree));

    finder.fit(high_dim.view()).unwrap();
    assert_eq!(finder.resolved(), Some(BackendKind::BallTree));

    let mut cosine = Finder::new(3, BackendKind::Auto, Metric::Cosine).unwrap();
    cosine.fit(low_dim.view()).unwrap();
    assert_eq!(cosine.resolved(), Some(BackendKind::Brute));
}

#[test]
fn auto_handles_heavily_duplicated_rows() {
    let corners = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let x = Array2::from_shape_fn((50_000, 2), |(i, j)| corners[i % 4][j]);
    let y: Vec<u8> = (0..50_000).map(|i| (i % 4) as u8).collect();

    let mut clf = KnnClassifier::<f64, u8>::from_names(5, "auto", "euclidean", "uniform").unwrap();
    clf.fit(x.view(), &y).unwrap();
    assert_eq!(clf.search().resolved(), Some(BackendKind::KdTree));
    assert_eq!(
        clf.predict_labels(array![[0.1, 0.0], [0.0, 0.9], [0.8, 0.1], [1.2, 1.1]].view())
            .unwrap(),
        vec![0, 1, 2, 3]
    );
}

#[test]
fn single_precision_features() {
    let x: Array2<f32> = array![[0.0, 0.0], [0.5, 0.5], [9.0, 9.0], [9.5, 8.5]];
    let mut clf = KnnClassifier::<f32, u8>::from_names(2, "kd_tree", "manhattan", "uniform")
        .unwrap();
    clf.fit(x.view(), &[0, 0, 1, 1]).unwrap();
    assert_eq!(
        clf.predict(array![[0.2f32, 0.1], [8.8, 9.1]].view()).unwrap(),
        array![0, 1]
    );
}

#[test]
fn refit_replaces_index() {
    let mut clf = KnnClassifier::<f64, &str>::from_names(1, "ball_tree", "euclidean", "uniform")
        .unwrap();
    clf.fit(array![[0.0, 0.0], [1.0, 1.0]].view(), &["a", "b"])
        .unwrap();
    clf.fit(array![[0.0], [10.0], [20.0]].view(), &["x", "y", "z"])
        .unwrap();
    assert_eq!(clf.search().n_samples_fit(), Some(3));
    assert_eq!(
        clf.predict_labels(array![[11.0]].view()).unwrap(),
        vec!["y"]
    );
}
