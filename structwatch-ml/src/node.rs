//! Isolation tree node implementation
//!
//! Trees are stored as flat arenas of [`Node`]s. Internal nodes refer to their
//! children by arena index, which keeps a tree a single allocation and makes
//! traversal a tight loop.

use crate::scoring::average_path_length;

/// Node type in the isolation tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeType {
    /// Internal node with split condition
    Internal {
        /// Feature index to split on
        feature: usize,
        /// Values below go left, the rest go right
        split_value: f64,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
    /// Leaf node (external)
    External {
        /// Number of training samples that reached this leaf
        size: usize,
    },
}

/// Arena node with its depth from the root
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Node type and data
    pub node_type: NodeType,
    /// Number of edges from the root
    pub depth: u32,
}

impl Node {
    /// Create an internal node
    pub fn internal(feature: usize, split_value: f64, left: usize, right: usize, depth: u32) -> Self {
        Self {
            node_type: NodeType::Internal {
                feature,
                split_value,
                left,
                right,
            },
            depth,
        }
    }

    /// Create an external (leaf) node
    pub fn external(size: usize, depth: u32) -> Self {
        Self {
            node_type: NodeType::External { size },
            depth,
        }
    }

    /// Check if node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self.node_type, NodeType::External { .. })
    }

    /// Path length credited to a sample that ends at this node
    ///
    /// For leaves holding several training points the tree stopped early, so
    /// the expected remaining depth `c(size)` is added.
    pub fn path_length(&self) -> f64 {
        match self.node_type {
            NodeType::External { size } => self.depth as f64 + average_path_length(size),
            NodeType::Internal { .. } => self.depth as f64,
        }
    }

    /// Child index to visit next, or `None` at a leaf
    pub fn traverse(&self, sample: &[f64]) -> Option<usize> {
        match self.node_type {
            NodeType::Internal {
                feature,
                split_value,
                left,
                right,
            } => {
                if sample[feature] < split_value {
                    Some(left)
                } else {
                    Some(right)
                }
            }
            NodeType::External { .. } => None,
        }
    }
}
