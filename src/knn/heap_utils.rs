//! Bounded max-heap that keeps the k best (smallest) `(distance, index)` pairs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use ordered_float::OrderedFloat; // For using f64 in BinaryHeap

/// A candidate neighbor: distance to the query plus the training row index.
///
/// Ordered by distance, then by index, so equal distances resolve to the
/// lower training row and every backend agrees on the same k rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapElement {
    pub distance: OrderedFloat<f64>,
    pub index: usize,
}

impl PartialOrd for HeapElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapElement {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: the worst kept candidate sits on top.
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Collects the `capacity` best candidates seen so far.
#[derive(Debug)]
pub struct KBestNeighbors {
    capacity: usize,
    heap: BinaryHeap<HeapElement>,
}

impl KBestNeighbors {
    pub fn new(capacity: usize) -> Self {
        KBestNeighbors {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    pub fn add(&mut self, distance: f64, index: usize) {
        if self.capacity == 0 {
            return;
        }
        let item = HeapElement {
            distance: OrderedFloat(distance),
            index,
        };
        if self.heap.len() < self.capacity {
            self.heap.push(item);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if item < *worst {
                *worst = item;
            }
        }
    }

    /// Distance of the worst kept candidate once the heap is full; `None`
    /// while it still has room (an unbounded search radius).
    pub fn current_farthest_distance(&self) -> Option<f64> {
        if self.heap.len() == self.capacity {
            self.heap.peek().map(|elem| elem.distance.0)
        } else {
            None
        }
    }

    /// Kept candidates as `(distance, index)`, nearest first.
    pub fn into_sorted(self) -> Vec<(f64, usize)> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|elem| (elem.distance.0, elem.index))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
