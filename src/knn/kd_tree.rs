//! k-d tree backend (`kd_tree`).

use ndarray::{ArrayView2, aview1};
use rand::seq::SliceRandom; // For random sampling
use rand::thread_rng;

use super::heap_utils::KBestNeighbors;
use super::{Feature, Metric, NeighborSearch, Neighbors, validate_query, validate_training};
use crate::common_types::DataPoint;
use crate::error::KnnError;

#[derive(Debug)]
pub struct KdTree<F> {
    pub root: Option<Box<TreeNode<F>>>,
    k_dimensions: usize,
    len: usize,
}

#[derive(Debug)]
pub struct TreeNode<F> {
    point: DataPoint<F>,
    splitting_dimension: usize,
    left: Option<Box<TreeNode<F>>>,
    right: Option<Box<TreeNode<F>>>,
}

impl<F: Feature> KdTree<F> {
    // Above this many points the pivot is the median of a random sample.
    const DEFAULT_AUTO_DECISION_THRESHOLD: usize = 1000;
    const DEFAULT_SAMPLE_SIZE_FOR_RANDOM: usize = 101;
    const DEFAULT_FALLBACK_THRESHOLD_FOR_RANDOM: usize = 25;

    /// Builds a tree over `points`, which must be non-empty and share one
    /// non-zero width.
    pub fn new(points: Vec<DataPoint<F>>) -> Self {
        let len = points.len();
        let k_dimensions = points.first().map_or(0, |p| p.features.len());
        debug_assert!(points.iter().all(|p| p.features.len() == k_dimensions));

        let root = if k_dimensions == 0 {
            None
        } else if len < Self::DEFAULT_AUTO_DECISION_THRESHOLD {
            let mut points = points;
            Self::build_recursive_exact_median(&mut points, k_dimensions, 0)
        } else {
            Self::build_recursive_random_sample_pivot(
                points,
                k_dimensions,
                0,
                Self::DEFAULT_SAMPLE_SIZE_FOR_RANDOM,
                Self::DEFAULT_FALLBACK_THRESHOLD_FOR_RANDOM,
            )
        };
        KdTree {
            root,
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

    fn build_recursive_exact_median(
        points_slice: &mut [DataPoint<F>],
        k_dimensions: usize,
        depth: usize,
    ) -> Option<Box<TreeNode<F>>> {
        if points_slice.is_empty() {
            return None;
        }

        let splitting_dimension = depth % k_dimensions;
        points_slice.sort_by(|a, b| {
            a.features[splitting_dimension]
                .partial_cmp(&b.features[splitting_dimension])
                .unwrap_or(std::cmp::Ordering::Equal) // inputs are validated finite
        });

        let median_idx = points_slice.len() / 2;
        let median_point = points_slice[median_idx].clone();

        let (left_slice, rest) = points_slice.split_at_mut(median_idx);
        let left = Self::build_recursive_exact_median(left_slice, k_dimensions, depth + 1);
        let right = Self::build_recursive_exact_median(&mut rest[1..], k_dimensions, depth + 1);

        Some(Box::new(TreeNode {
            point: median_point,
            splitting_dimension,
            left,
            right,
        }))
    }

    /// Pivot = median of a random sample; the remaining points are moved
    /// into the two halves. Small inputs fall back to the exact median.
    ///
    /// Points whose coordinate equals the pivot's are shared between the
    /// halves so that heavily duplicated data still splits near the middle.
    fn build_recursive_random_sample_pivot(
        mut points: Vec<DataPoint<F>>,
        k_dimensions: usize,
        depth: usize,
        sample_size: usize,
        fallback_threshold: usize,
    ) -> Option<Box<TreeNode<F>>> {
        if points.is_empty() {
            return None;
        }
        if points.len() < fallback_threshold || points.len() <= sample_size {
            return Self::build_recursive_exact_median(&mut points, k_dimensions, depth);
        }

        let splitting_dimension = depth % k_dimensions;

        let mut rng = thread_rng();
        let mut sample: Vec<(F, usize)> = points
            .choose_multiple(&mut rng, sample_size)
            .map(|p| (p.features[splitting_dimension], p.index))
            .collect();
        sample.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let (_, pivot_index) = sample[sample.len() / 2];

        // The pivot becomes this node; everything else is partitioned around it.
        let pivot_pos = points
            .iter()
            .position(|p| p.index == pivot_index)
            .unwrap_or(0);
        let node_point = points.swap_remove(pivot_pos);
        let pivot_value = node_point.features[splitting_dimension];

        let half = points.len() / 2;
        let mut left_points = Vec::with_capacity(half);
        let mut equal_points = Vec::new();
        let mut right_points = Vec::with_capacity(half);
        for point in points {
            let coord = point.features[splitting_dimension];
            if coord < pivot_value {
                left_points.push(point);
            } else if coord > pivot_value {
                right_points.push(point);
            } else {
                equal_points.push(point);
            }
        }

        // left <= pivot <= right holds whichever side the ties land on.
        let ties_to_left = half.saturating_sub(left_points.len()).min(equal_points.len());
        let ties_to_right = equal_points.split_off(ties_to_left);
        left_points.extend(equal_points);
        right_points.extend(ties_to_right);

        let left = Self::build_recursive_random_sample_pivot(
            left_points,
            k_dimensions,
            depth + 1,
            sample_size,
            fallback_threshold,
        );
        let right = Self::build_recursive_random_sample_pivot(
            right_points,
            k_dimensions,
            depth + 1,
            sample_size,
            fallback_threshold,
        );

        Some(Box::new(TreeNode {
            point: node_point,
            splitting_dimension,
            left,
            right,
        }))
    }

    /// The `n_neighbors` nearest points to `target` as `(distance, index)`,
    /// nearest first. `target` must have the tree's width.
    pub fn find_nearest_neighbors(
        &self,
        target: &[F],
        n_neighbors: usize,
        metric: Metric,
    ) -> Vec<(f64, usize)> {
        if n_neighbors == 0 || target.len() != self.k_dimensions {
            return Vec::new();
        }
        let mut best_n = KBestNeighbors::new(n_neighbors);
        Self::search_recursive(&self.root, target, &mut best_n, metric);
        best_n.into_sorted()
    }

    fn search_recursive(
        current_node_opt: &Option<Box<TreeNode<F>>>,
        target: &[F],
        best_n: &mut KBestNeighbors,
        metric: Metric,
    ) {
        let current_node = match current_node_opt {
            Some(node) => node,
            None => return,
        };

        let splitting_dim = current_node.splitting_dimension;
        let node_coord = current_node.point.features[splitting_dim];
        let target_coord = target[splitting_dim];

        // Visit the side of the splitting plane containing the target first.
        let (primary_child, secondary_child) = if target_coord < node_coord {
            (&current_node.left, &current_node.right)
        } else {
            (&current_node.right, &current_node.left)
        };

        Self::search_recursive(primary_child, target, best_n, metric);

        let dist_to_node_point = metric.distance(aview1(target), aview1(&current_node.point.features));
        best_n.add(dist_to_node_point, current_node.point.index);

        // For every Minkowski metric the gap along one axis bounds the full
        // distance from below. `<=` keeps equal-distance candidates reachable
        // so ties still resolve to the lowest index.
        let dist_to_hyperplane: f64 = (target_coord - node_coord).abs().as_();
        if best_n
            .current_farthest_distance()
            .is_none_or(|radius| dist_to_hyperplane <= radius)
        {
            Self::search_recursive(secondary_child, target, best_n, metric);
        }
    }
}

/// [`NeighborSearch`] adapter over a [`KdTree`].
#[derive(Debug)]
pub struct KdTreeFinder<F> {
    n_neighbors: usize,
    metric: Metric,
    tree: Option<KdTree<F>>,
}

impl<F: Feature> KdTreeFinder<F> {
    /// `metric` must be a true metric; [`crate::config::KnnConfig::validate`]
    /// rejects the others before a finder is built.
    pub fn new(n_neighbors: usize, metric: Metric) -> Self {
        Self {
            n_neighbors,
            metric,
            tree: None,
        }
    }
}

impl<F: Feature> NeighborSearch<F> for KdTreeFinder<F> {
    fn fit(&mut self, points: ArrayView2<'_, F>) -> Result<(), KnnError> {
        validate_training(points)?;
        self.tree = Some(KdTree::new(DataPoint::from_rows(points)));
        Ok(())
    }

    fn kneighbors(&self, query: ArrayView2<'_, F>) -> Result<Neighbors, KnnError> {
        let tree = self.tree.as_ref().ok_or(KnnError::NotFitted)?;
        validate_query(query, tree.k_dimensions, tree.len(), self.n_neighbors)?;

        let rows = query
            .rows()
            .into_iter()
            .map(|row| tree.find_nearest_neighbors(&row.to_vec(), self.n_neighbors, self.metric))
            .collect();
        Ok(Neighbors::from_sorted_rows(self.n_neighbors, rows))
    }

    fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    fn n_samples_fit(&self) -> Option<usize> {
        self.tree.as_ref().map(KdTree::len)
    }
}
