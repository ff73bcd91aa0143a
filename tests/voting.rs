//! Vote aggregation through the public classifier API.

use batched_knn::{KnnClassifier, KnnConfig, Weighting};
use ndarray::array;
use ordered_float::OrderedFloat;

fn classifier<L: Ord + Clone>(k: usize, weighting: Weighting) -> KnnClassifier<f64, L> {
    KnnClassifier::new(&KnnConfig::new(k).with_weighting(weighting)).unwrap()
}

#[test]
fn uniform_majority_wins() {
    let x = array![[0.0], [1.0], [2.0]];
    let mut clf = classifier(3, Weighting::Uniform);
    clf.fit(x.view(), &["A", "A", "B"]).unwrap();
    assert_eq!(clf.predict_labels(array![[1.9]].view()).unwrap(), vec!["A"]);
}

#[test]
fn distance_weighting_prefers_closer_label() {
    // From the query at 2.0: A is 2 away, B is 1 away.
    let x = array![[0.0], [3.0]];
    let y = ["A", "B"];
    let query = array![[2.0]];

    let mut weighted = classifier(2, Weighting::Distance);
    weighted.fit(x.view(), &y).unwrap();
    assert_eq!(weighted.predict_labels(query.view()).unwrap(), vec!["B"]);

    // 1-1 tie under uniform votes goes to the first class.
    let mut uniform = classifier(2, Weighting::Uniform);
    uniform.fit(x.view(), &y).unwrap();
    assert_eq!(uniform.predict_labels(query.view()).unwrap(), vec!["A"]);
}

#[test]
fn exact_match_casts_no_weight() {
    // The query coincides with the only B row.
    let x = array![[0.0], [3.0], [4.0]];
    let mut clf = classifier(3, Weighting::Distance);
    clf.fit(x.view(), &["B", "A", "A"]).unwrap();
    assert_eq!(clf.predict_labels(array![[0.0]].view()).unwrap(), vec!["A"]);
}

#[test]
fn exact_tie_is_deterministic() {
    let x = array![[-1.0], [1.0]];
    let mut clf = classifier(2, Weighting::Distance);
    clf.fit(x.view(), &["zebra", "apple"]).unwrap();
    for _ in 0..10 {
        assert_eq!(clf.predict(array![[0.0]].view()).unwrap(), array![0]);
        assert_eq!(
            clf.predict_labels(array![[0.0]].view()).unwrap(),
            vec!["apple"]
        );
    }
}

#[test]
fn numeric_labels_sort_numerically() {
    let x = array![[0.0], [1.0], [2.0]];
    let mut clf = classifier(1, Weighting::Uniform);
    clf.fit(x.view(), &[10, 9, 100]).unwrap();
    assert_eq!(clf.classes(), &[9, 10, 100]);
    assert_eq!(
        clf.predict(array![[0.1], [1.1], [2.1]].view()).unwrap(),
        array![1, 0, 2]
    );
}

#[test]
fn sparse_label_values() {
    let x = array![[0.0], [1.0], [5.0], [6.0]];
    let mut clf = classifier(2, Weighting::Uniform);
    clf.fit(x.view(), &[7u32, 7, 1003, 1003]).unwrap();
    assert_eq!(clf.classes(), &[7, 1003]);
    assert_eq!(
        clf.predict_labels(array![[0.4], [5.6]].view()).unwrap(),
        vec![7, 1003]
    );
}

#[test]
fn float_labels_through_ordered_float() {
    let x = array![[0.0], [1.0], [10.0]];
    let y = [OrderedFloat(2.5), OrderedFloat(-1.0), OrderedFloat(0.5)];
    let mut clf = classifier(1, Weighting::Uniform);
    clf.fit(x.view(), &y).unwrap();
    assert_eq!(
        clf.classes(),
        &[OrderedFloat(-1.0), OrderedFloat(0.5), OrderedFloat(2.5)]
    );
    assert_eq!(
        clf.predict_labels(array![[9.0]].view()).unwrap(),
        vec![OrderedFloat(0.5)]
    );
}

#[test]
fn precomputed_neighbors_vote_like_predict() {
    let x = array![[0.0, 0.0], [0.0, 1.0], [4.0, 4.0], [4.0, 5.0], [9.0, 9.0]];
    let y = ["p", "p", "q", "q", "r"];
    let query = array![[0.2, 0.4], [4.1, 4.4], [8.0, 8.0]];
    let mut clf = classifier(3, Weighting::Distance);
    clf.fit(x.view(), &y).unwrap();

    let neighbors = clf.kneighbors(query.view()).unwrap();
    assert_eq!(
        clf.predict_precomputed(&neighbors).unwrap(),
        clf.predict(query.view()).unwrap()
    );
}
