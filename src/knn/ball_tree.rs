//! Ball tree backend (`ball_tree`).

use ndarray::{ArrayView2, aview1};
use num_traits::NumCast;

use super::heap_utils::KBestNeighbors;
use super::{Feature, Metric, NeighborSearch, Neighbors, validate_query, validate_training};
use crate::common_types::DataPoint;
use crate::error::KnnError;

pub fn mean<F: Feature>(vector: &[F]) -> F {
    let length = vector.len();
    if length == 0 {
        return F::nan();
    }
    let sum = vector.iter().fold(F::zero(), |acc, &x| acc + x);
    match <F as NumCast>::from(length) {
        Some(n) => sum / n,
        None => F::nan(),
    }
}

/// Sample variance; NaN for fewer than two values.
pub fn variance<F: Feature>(vector: &[F]) -> F {
    let length = vector.len();
    if length < 2 {
        return F::nan();
    }
    let mean_val = mean(vector);
    let sum_of_squared_differences = vector
        .iter()
        .fold(F::zero(), |acc, &f| acc + (f - mean_val).powi(2));

    match <F as NumCast>::from(length - 1) {
        Some(n_minus_1) => sum_of_squared_differences / n_minus_1,
        None => F::nan(),
    }
}

#[derive(Debug, Clone)]
pub enum BallNodeContents<F> {
    Internal {
        left_child: Box<BallTreeNode<F>>,
        right_child: Box<BallTreeNode<F>>,
    },
    Leaf {
        points: Vec<DataPoint<F>>,
    },
}

/// A ball: every point below this node lies within `radius` of `centroid`
/// under the tree's metric.
#[derive(Debug, Clone)]
pub struct BallTreeNode<F> {
    pub centroid: Vec<F>,
    pub radius: f64,
    pub contents: BallNodeContents<F>,
}

#[derive(Debug)]
pub struct BallTree<F> {
    pub root: Option<Box<BallTreeNode<F>>>,
    metric: Metric,
    k_dimensions: usize,
    len: usize,
}

impl<F: Feature> BallTree<F> {
    pub const DEFAULT_LEAF_SIZE: usize = 40;

    /// Builds a tree over `points` (non-empty, one shared non-zero width).
    /// `metric` must satisfy the triangle inequality.
    pub fn new(points: Vec<DataPoint<F>>, leaf_size: usize, metric: Metric) -> Self {
        let len = points.len();
        let k_dimensions = points.first().map_or(0, |p| p.features.len());
        debug_assert!(points.iter().all(|p| p.features.len() == k_dimensions));
        debug_assert!(metric.is_true_metric());

        let root = if len == 0 || k_dimensions == 0 {
            None
        } else {
            Some(Self::build_recursive(points, leaf_size.max(1), k_dimensions, metric))
        };
        BallTree {
            root,
            metric,
            k_dimensions,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn calculate_centroid(points_slice: &[DataPoint<F>], k_dimensions: usize) -> Vec<F> {
        let mut centroid = vec![F::zero(); k_dimensions];
        for point in points_slice {
            for (c, &x) in centroid.iter_mut().zip(point.features.iter()) {
                *c = *c + x;
            }
        }
        let n: F = <F as NumCast>::from(points_slice.len()).unwrap_or_else(F::one);
        centroid.iter_mut().for_each(|c| *c = *c / n);
        centroid
    }

    fn calculate_bounding_ball(
        points_slice: &[DataPoint<F>],
        k_dimensions: usize,
        metric: Metric,
    ) -> (Vec<F>, f64) {
        let centroid = Self::calculate_centroid(points_slice, k_dimensions);
        let radius = points_slice
            .iter()
            .map(|p| metric.distance(aview1(&centroid), aview1(&p.features)))
            .fold(0.0_f64, f64::max);
        (centroid, radius)
    }

    fn build_recursive(
        mut points: Vec<DataPoint<F>>,
        leaf_size: usize,
        k_dimensions: usize,
        metric: Metric,
    ) -> Box<BallTreeNode<F>> {
        let (centroid, radius) = Self::calculate_bounding_ball(&points, k_dimensions, metric);
        let leaf = |points: Vec<DataPoint<F>>, centroid: Vec<F>, radius: f64| {
            Box::new(BallTreeNode {
                centroid,
                radius,
                contents: BallNodeContents::Leaf { points },
            })
        };

        if points.len() <= leaf_size {
            return leaf(points, centroid, radius);
        }

        // Split along the dimension of greatest spread.
        let mut best_splitting_dimension = 0;
        let mut max_variance = F::neg_infinity();
        for dim_idx in 0..k_dimensions {
            let dim_values: Vec<F> = points.iter().map(|p| p.features[dim_idx]).collect();
            let var = variance(&dim_values);
            if !var.is_nan() && var > max_variance {
                max_variance = var;
                best_splitting_dimension = dim_idx;
            }
        }

        // All points coincide along every axis: nothing to split.
        if max_variance.is_nan() || max_variance <= F::epsilon() {
            return leaf(points, centroid, radius);
        }

        let median_idx = points.len() / 2;
        points.select_nth_unstable_by(median_idx, |a, b| {
            a.features[best_splitting_dimension]
                .partial_cmp(&b.features[best_splitting_dimension])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let right_points = points.split_off(median_idx);
        let left_points = points;

        Box::new(BallTreeNode {
            centroid,
            radius,
            contents: BallNodeContents::Internal {
                left_child: Self::build_recursive(left_points, leaf_size, k_dimensions, metric),
                right_child: Self::build_recursive(right_points, leaf_size, k_dimensions, metric),
            },
        })
    }

    /// The `n_neighbors` nearest points to `target` as `(distance, index)`,
    /// nearest first.
    pub fn find_nearest_neighbors(&self, target: &[F], n_neighbors: usize) -> Vec<(f64, usize)> {
        if n_neighbors == 0 || target.len() != self.k_dimensions {
            return Vec::new();
        }
        let mut best_n = KBestNeighbors::new(n_neighbors);
        if let Some(root) = &self.root {
            self.search_nn_recursive(root, target, &mut best_n);
        }
        best_n.into_sorted()
    }

    /// Lower bound on the distance from `target` to any point inside `node`.
    fn min_possible_distance(&self, node: &BallTreeNode<F>, target: &[F]) -> f64 {
        self.metric.distance(aview1(target), aview1(&node.centroid)) - node.radius
    }

    fn search_nn_recursive(
        &self,
        current_node: &BallTreeNode<F>,
        target: &[F],
        best_n: &mut KBestNeighbors,
    ) {
        // Prune only when strictly farther, so equal-distance candidates with
        // lower indices are still considered.
        if let Some(farthest) = best_n.current_farthest_distance() {
            if self.min_possible_distance(current_node, target) > farthest {
                return;
            }
        }

        match &current_node.contents {
            BallNodeContents::Leaf { points } => {
                for point in points {
                    let dist = self.metric.distance(aview1(target), aview1(&point.features));
                    best_n.add(dist, point.index);
                }
            }
            BallNodeContents::Internal {
                left_child,
                right_child,
            } => {
                // Search the child whose ball is nearer first.
                let left_bound = self.min_possible_distance(left_child, target);
                let right_bound = self.min_possible_distance(right_child, target);
                let (primary, secondary) = if left_bound <= right_bound {
                    (left_child, right_child)
                } else {
                    (right_child, left_child)
                };
                self.search_nn_recursive(primary, target, best_n);
                self.search_nn_recursive(secondary, target, best_n);
            }
        }
    }
}

/// [`NeighborSearch`] adapter over a [`BallTree`].
#[derive(Debug)]
pub struct BallTreeFinder<F> {
    n_neighbors: usize,
    metric: Metric,
    leaf_size: usize,
    tree: Option<BallTree<F>>,
}

impl<F: Feature> BallTreeFinder<F> {
    /// `metric` must be a true metric; [`crate::config::KnnConfig::validate`]
    /// rejects the others before a finder is built.
    pub fn new(n_neighbors: usize, metric: Metric) -> Self {
        Self {
            n_neighbors,
            metric,
            leaf_size: BallTree::<F>::DEFAULT_LEAF_SIZE,
            tree: None,
        }
    }

    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size.max(1);
        self
    }
}

impl<F: Feature> NeighborSearch<F> for BallTreeFinder<F> {
    fn fit(&mut self, points: ArrayView2<'_, F>) -> Result<(), KnnError> {
        validate_training(points)?;
        self.tree = Some(BallTree::new(
            DataPoint::from_rows(points),
            self.leaf_size,
            self.metric,
        ));
        Ok(())
    }

    fn kneighbors(&self, query: ArrayView2<'_, F>) -> Result<Neighbors, KnnError> {
        let tree = self.tree.as_ref().ok_or(KnnError::NotFitted)?;
        validate_query(query, tree.k_dimensions, tree.len(), self.n_neighbors)?;

        let rows = query
            .rows()
            .into_iter()
            .map(|row| tree.find_nearest_neighbors(&row.to_vec(), self.n_neighbors))
            .collect();
        Ok(Neighbors::from_sorted_rows(self.n_neighbors, rows))
    }

    fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    fn n_samples_fit(&self) -> Option<usize> {
        self.tree.as_ref().map(BallTree::len)
    }
}
