//! Isolation Forest implementation
//!
//! This module provides the main Isolation Forest algorithm that combines
//! multiple isolation trees for robust anomaly detection.

use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use structwatch_core::{DetectionError, DetectionResult};

use crate::{calculate_anomaly_score, AnomalyScore, IsolationTree};

/// Default number of trees
pub const DEFAULT_NUM_TREES: usize = 100;

/// Default per-tree subsample size
pub const DEFAULT_SAMPLE_SIZE: usize = 256;

/// Hard cap on tree depth, keeps recursion and scoring bounded
pub const MAX_TREE_DEPTH: u32 = 64;

/// Configuration for Isolation Forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub num_trees: usize,
    /// Sample size for each tree, clamped to the training set size
    pub sample_size: usize,
    /// Maximum tree depth; `None` uses `ceil(log2(sample_size))`
    pub max_depth: Option<u32>,
    /// Random seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: DEFAULT_NUM_TREES,
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_depth: None,
            seed: Some(42),
        }
    }
}

impl ForestConfig {
    /// Check that the forest can be grown
    pub fn validate(&self) -> DetectionResult<()> {
        if self.num_trees == 0 {
            return Err(DetectionError::invalid_config("num_trees must be at least 1"));
        }
        if self.sample_size < 2 {
            return Err(DetectionError::invalid_config("sample_size must be at least 2"));
        }
        if let Some(depth) = self.max_depth {
            if depth == 0 || depth > MAX_TREE_DEPTH {
                return Err(DetectionError::invalid_config(format!(
                    "max_depth must be within 1..={}",
                    MAX_TREE_DEPTH
                )));
            }
        }
        Ok(())
    }

    /// Depth limit for trees grown on `sample_size` points
    pub fn depth_for(&self, sample_size: usize) -> u32 {
        self.max_depth.unwrap_or_else(|| {
            let depth = libm::ceil(libm::log2(sample_size.max(2) as f64)) as u32;
            depth.clamp(1, MAX_TREE_DEPTH)
        })
    }
}

/// Isolation Forest for anomaly detection
///
/// Immutable once grown: scoring takes `&self` and never changes the trees.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForest {
    /// Individual trees
    trees: Vec<IsolationTree>,
    /// Effective per-tree sample size
    sample_size: usize,
    /// Dimensionality of the training data
    num_features: usize,
    /// Number of samples used for training
    num_samples: usize,
}

impl IsolationForest {
    /// Grow a forest on `samples`
    ///
    /// Every sample must have the same non-zero number of finite features.
    pub fn fit(samples: &[Vec<f64>], config: &ForestConfig) -> DetectionResult<Self> {
        config.validate()?;

        if samples.len() < 2 {
            return Err(DetectionError::InsufficientData {
                required: 2,
                available: samples.len(),
            });
        }

        let num_features = samples[0].len();
        if num_features == 0 {
            return Err(DetectionError::invalid_config("samples have no features"));
        }
        for sample in samples {
            if sample.len() != num_features {
                return Err(DetectionError::DimensionMismatch {
                    expected: num_features,
                    actual: sample.len(),
                });
            }
            if let Some(feature) = sample.iter().position(|v| !v.is_finite()) {
                return Err(DetectionError::validation(
                    format!("feature {}", feature),
                    "reading is not finite",
                ));
            }
        }

        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let sample_size = config.sample_size.min(samples.len());
        let max_depth = config.depth_for(sample_size);

        let trees = (0..config.num_trees)
            .map(|_| {
                // Random sampling without replacement
                let mut subset = index::sample(&mut rng, samples.len(), sample_size).into_vec();
                IsolationTree::grow(samples, &mut subset, max_depth, &mut rng)
            })
            .collect();

        Ok(Self {
            trees,
            sample_size,
            num_features,
            num_samples: samples.len(),
        })
    }

    /// Calculate anomaly score for a sample
    pub fn anomaly_score(&self, sample: &[f64]) -> DetectionResult<AnomalyScore> {
        if sample.len() != self.num_features {
            return Err(DetectionError::DimensionMismatch {
                expected: self.num_features,
                actual: sample.len(),
            });
        }

        // Calculate average path length across all trees
        let total_path_length: f64 = self.trees.iter().map(|tree| tree.path_length(sample)).sum();
        let avg_path_length = total_path_length / self.trees.len() as f64;

        let score = calculate_anomaly_score(avg_path_length, self.sample_size);
        Ok(AnomalyScore::new(score, avg_path_length, self.trees.len()))
    }

    /// Score many samples, preserving order
    pub fn predict(&self, samples: &[Vec<f64>]) -> DetectionResult<Vec<AnomalyScore>> {
        samples.iter().map(|s| self.anomaly_score(s)).collect()
    }

    /// Dimensionality expected by `anomaly_score`
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Get forest statistics
    pub fn stats(&self) -> ForestStats {
        ForestStats {
            num_trees: self.trees.len(),
            total_nodes: self.trees.iter().map(|t| t.node_count()).sum(),
            max_depth: self.trees.iter().map(|t| t.depth()).max().unwrap_or(0),
            sample_size: self.sample_size,
            num_samples: self.num_samples,
        }
    }
}

/// Forest statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestStats {
    /// Number of trees
    pub num_trees: usize,
    /// Total nodes across all trees
    pub total_nodes: usize,
    /// Deepest node across all trees
    pub max_depth: u32,
    /// Per-tree subsample size
    pub sample_size: usize,
    /// Number of training samples
    pub num_samples: usize,
}
