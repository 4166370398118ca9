//! Isolation tree implementation
//!
//! This module provides the core isolation tree data structure and algorithms.
//! Trees are built by recursively partitioning data until isolation is achieved
//! or maximum depth is reached.

use rand::Rng;

use crate::node::{Node, NodeType};

/// Isolation tree structure
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationTree {
    /// Tree nodes in arena representation, root at index 0
    nodes: Vec<Node>,
    /// Depth at which growth stops
    max_depth: u32,
}

impl IsolationTree {
    /// Grow a tree over the rows of `data` selected by `indices`
    ///
    /// `indices` is reordered in place while partitioning. Every row must
    /// have the same, non-zero length; callers validate this once per fit.
    pub fn grow<R: Rng + ?Sized>(
        data: &[Vec<f64>],
        indices: &mut [usize],
        max_depth: u32,
        rng: &mut R,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(2 * indices.len()),
            max_depth,
        };
        tree.build(data, indices, 0, rng);
        tree
    }

    /// Build tree recursively, returning the index of the created node
    fn build<R: Rng + ?Sized>(
        &mut self,
        data: &[Vec<f64>],
        indices: &mut [usize],
        depth: u32,
        rng: &mut R,
    ) -> usize {
        let node_index = self.nodes.len();

        // Check termination conditions
        if depth >= self.max_depth || indices.len() <= 1 {
            self.nodes.push(Node::external(indices.len(), depth));
            return node_index;
        }

        // All samples identical on every feature?
        let Some((feature, split_value)) = select_split(data, indices, rng) else {
            self.nodes.push(Node::external(indices.len(), depth));
            return node_index;
        };

        let mid = partition(data, indices, feature, split_value);

        // Split landed exactly on the minimum, nothing went left
        if mid == 0 || mid == indices.len() {
            self.nodes.push(Node::external(indices.len(), depth));
            return node_index;
        }

        // Reserve the slot, children are appended after it
        self.nodes.push(Node::external(0, depth));

        let (left_indices, right_indices) = indices.split_at_mut(mid);
        let left = self.build(data, left_indices, depth + 1, rng);
        let right = self.build(data, right_indices, depth + 1, rng);

        self.nodes[node_index] = Node::internal(feature, split_value, left, right, depth);
        node_index
    }

    /// Path length for a sample
    pub fn path_length(&self, sample: &[f64]) -> f64 {
        let mut current = match self.nodes.first() {
            Some(root) => root,
            None => return 0.0,
        };

        while let Some(next) = current.traverse(sample) {
            current = &self.nodes[next];
        }

        current.path_length()
    }

    /// Get the number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Get tree depth
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Configured depth limit
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Total training samples held by the leaves
    pub fn leaf_population(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| match n.node_type {
                NodeType::External { size } => size,
                NodeType::Internal { .. } => 0,
            })
            .sum()
    }
}

/// Pick a random feature with non-zero spread and a split uniformly inside it
///
/// Returns `None` when every feature is constant over `indices`.
fn select_split<R: Rng + ?Sized>(
    data: &[Vec<f64>],
    indices: &[usize],
    rng: &mut R,
) -> Option<(usize, f64)> {
    let num_features = data[indices[0]].len();

    let candidates: Vec<(usize, f64, f64)> = (0..num_features)
        .filter_map(|feature| {
            let (min, max) = feature_range(data, indices, feature);
            (max > min).then_some((feature, min, max))
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    Some((feature, rng.gen_range(min..max)))
}

/// Get min/max range for a feature
fn feature_range(data: &[Vec<f64>], indices: &[usize], feature: usize) -> (f64, f64) {
    indices
        .iter()
        .map(|&i| data[i][feature])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        })
}

/// Move rows with `feature < split_value` to the front; returns their count
fn partition(data: &[Vec<f64>], indices: &mut [usize], feature: usize, split_value: f64) -> usize {
    let mut mid = 0;
    for i in 0..indices.len() {
        if data[indices[i]][feature] < split_value {
            indices.swap(i, mid);
            mid += 1;
        }
    }
    mid
}
