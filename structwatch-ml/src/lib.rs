//! Unsupervised Anomaly Scoring for Structural Sensor Data
//!
//! ## Overview
//!
//! This crate provides the statistical half of structwatch's detection: an
//! Isolation Forest grown on normalized reference samples, plus a calibrated
//! decision threshold. It catches combinations of readings that are unusual
//! for the structure even when every channel is inside its static bounds.
//!
//! ## Why Isolation Forest?
//!
//! 1. **Unsupervised**: reference data only needs to be mostly normal
//! 2. **Multivariate**: learns joint behaviour of strain, vibration, displacement
//! 3. **Bounded inference**: scoring walks `num_trees` paths of at most `max_depth`
//! 4. **Reproducible**: seeded partitioning gives identical models per seed
//!
//! ## Algorithm Overview
//!
//! The algorithm isolates anomalies by randomly partitioning data:
//! ```text
//! Normal points: Need many partitions to isolate
//! Anomalies: Isolated with few partitions
//!
//! Anomaly Score = 2^(-E[h(x)] / c(ψ))
//! ```
//!
//! `E[h(x)]` is the mean path length over the ensemble and `c(ψ)` the average
//! path length of an unsuccessful BST search over the per-tree sample size ψ.
//! A score of 0.5 means "as deep as an average point"; scores near 1 are
//! isolated almost immediately.
//!
//! ## Threshold Calibration
//!
//! After the forest is grown, every reference sample is scored and the
//! decision threshold is set at the `1 - contamination` quantile of those
//! scores. With `contamination = 0.05` about 5% of the reference batch lands
//! at or above the threshold.
//!
//! ```text
//! reference scores (sorted)
//! |.......................................|:::::|
//! 0                                    threshold 1
//!                                        └ 5% ┘
//! ```
//!
//! ## Integration with Rule-Based Detection
//!
//! ```rust
//! use structwatch_ml::{DetectorConfig, StatisticalDetector};
//!
//! let reference: Vec<Vec<f64>> = (0..100)
//!     .map(|i| vec![((i % 10) as f64 - 4.5) / 2.9, ((i / 10) as f64 - 4.5) / 2.9])
//!     .collect();
//!
//! let mut detector = StatisticalDetector::new(DetectorConfig::new(0.05, Some(42)));
//! detector.fit(&reference)?;
//!
//! let score = detector.score(&[0.1, -0.2])?;
//! if score >= detector.state().map_or(1.0, |s| s.threshold()) {
//!     // Unusual but within static limits
//! }
//! # Ok::<(), structwatch_core::DetectionError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod detector;
pub mod forest;
pub mod node;
pub mod scoring;
pub mod tree;

pub use detector::{DetectorConfig, ModelState, StatisticalDetector, DEFAULT_CONTAMINATION};
pub use forest::{ForestConfig, ForestStats, IsolationForest, DEFAULT_NUM_TREES, DEFAULT_SAMPLE_SIZE};
pub use node::{Node, NodeType};
pub use scoring::{average_path_length, calculate_anomaly_score, quantile, AnomalyScore};
pub use tree::IsolationTree;
