//! Anomaly score calculation and threshold calibration

use serde::{Deserialize, Serialize};

/// Euler-Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Anomaly score result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScore {
    /// Score in `(0, 1]`; 0.5 is an average point, near 1 is a clear outlier
    pub score: f64,
    /// Average path length across trees
    pub avg_path_length: f64,
    /// Number of trees used
    pub num_trees: usize,
}

impl AnomalyScore {
    /// Create a new anomaly score
    pub fn new(score: f64, avg_path_length: f64, num_trees: usize) -> Self {
        Self {
            score,
            avg_path_length,
            num_trees,
        }
    }

    /// Check if score reaches `threshold`
    pub fn is_anomaly(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}

/// Average path length `c(n)` of an unsuccessful search in a BST of `n` points
///
/// `c(n) = 2 H(n-1) - 2 (n-1) / n`, with `H(i) ≈ ln(i) + γ`.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * (libm::log(n - 1.0) + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Calculate anomaly score from path lengths
///
/// Uses the formula: score = 2^(-E(h(x))/c(n))
/// where E(h(x)) is expected path length and c(n) is average path length
/// for the per-tree sample size `n`.
pub fn calculate_anomaly_score(avg_path_length: f64, sample_size: usize) -> f64 {
    let expected = average_path_length(sample_size);
    if expected == 0.0 {
        return 0.5; // Neutral score
    }

    libm::exp2(-avg_path_length / expected)
}

/// Linear-interpolated quantile of `values`, `q` in `[0, 1]`
///
/// Returns `None` for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = libm::floor(position) as usize;
    let upper = libm::ceil(position) as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
