//! Core detection building blocks for structwatch
//!
//! Turns raw multi-channel structural sensor samples (strain, vibration,
//! temperature, displacement) into anomaly verdicts. This crate holds the
//! data model, per-channel normalization and rule-based detection; the
//! Isolation Forest lives in `structwatch-ml` and the orchestrating engine in
//! `structwatch-engine`.
//!
//! Key properties:
//! - Pure computation, no I/O and no formatting of results
//! - Fitted state is immutable once built
//! - Every failure is a typed [`DetectionError`]
//!
//! ```no_run
//! use structwatch_core::{ChannelBounds, Sample, ThresholdDetector};
//!
//! let detector = ThresholdDetector::new()
//!     .with_bounds("strain", ChannelBounds::upper(120.0));
//!
//! match detector.classify(&Sample::new(0).with("strain", 131.0)) {
//!     Ok(verdict) if verdict.is_anomaly => {}, // Raise an alert
//!     Ok(_) => {},                              // Normal
//!     Err(e) => {},                             // Skip malformed sample
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod detectors;
pub mod errors;
pub mod normalizer;
pub mod sample;
pub mod stream;
pub mod traits;
pub mod verdict;

// Public API
pub use detectors::{ChannelBounds, ThresholdDetector};
pub use errors::{DetectionError, DetectionResult};
pub use normalizer::{NormalizationStats, Normalizer, MIN_REFERENCE_SAMPLES};
pub use sample::{ChannelSet, Sample, Timestamp};
pub use traits::{Detector, Observation};
pub use verdict::{BoundViolation, Contribution, DetectorKind, Finding, Verdict, Violation};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
