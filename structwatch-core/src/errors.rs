//! Error Types for Detection Failures
//!
//! ## Design Philosophy
//!
//! Every failure the detection core can report is a variant of a single
//! enum, [`DetectionError`]. Errors are returned synchronously from the call
//! that failed. Nothing is retried internally: detection is deterministic, so
//! retrying the same call with the same input produces the same outcome.
//!
//! ## Error Categories
//!
//! ### Sample Problems
//! - `Validation`: a reading is missing, unexpected or not a finite number
//! - `DimensionMismatch`: a dense feature vector has the wrong length
//!
//! ### Lifecycle Problems
//! - `InsufficientData`: the reference batch is too small to fit
//! - `NotFitted`: a detector that needs fitting was used before `fit`
//!
//! ### Configuration Problems
//! - `UnknownChannel`: bounds exist for a channel the sample or engine lacks
//! - `InvalidConfig`: a parameter is out of its legal range
//!
//! Zero-variance channels are deliberately absent from this list. They are
//! normalized to zero instead of being reported.
//!
//! ## Handling Strategy
//!
//! ```rust
//! use structwatch_core::DetectionError;
//!
//! fn on_error(err: DetectionError) {
//!     match err {
//!         DetectionError::Validation { .. } | DetectionError::DimensionMismatch { .. } => {
//!             // Malformed sample: skip it and keep streaming
//!         }
//!         DetectionError::NotFitted => {
//!             // Fit the engine on a reference batch first
//!         }
//!         _ => {
//!             // Configuration or data problem, fix and retry
//!         }
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type for detection operations
pub type DetectionResult<T> = Result<T, DetectionError>;

/// Errors raised by the normalizer, the detectors and the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Sample is malformed for the configured channel set
    #[error("Invalid sample at channel '{channel}': {reason}")]
    Validation {
        /// Channel that failed validation
        channel: String,
        /// What was wrong with it
        reason: &'static str,
    },

    /// Dense feature vector length differs from the fitted dimensionality
    #[error("Sample has {actual} features, expected {expected}")]
    DimensionMismatch {
        /// Feature count seen at fit time
        expected: usize,
        /// Feature count of the offending sample
        actual: usize,
    },

    /// Not enough reference samples to fit
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData {
        /// Minimum number of samples needed
        required: usize,
        /// Number of samples supplied
        available: usize,
    },

    /// A detector that requires fitting was used before `fit`
    #[error("Detector has not been fitted")]
    NotFitted,

    /// Bounds are configured for a channel with no reading
    #[error("Bounds configured for unknown channel '{channel}'")]
    UnknownChannel {
        /// The bounded channel
        channel: String,
    },

    /// A configuration parameter is outside its legal range
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Human readable description
        reason: String,
    },
}

impl DetectionError {
    /// Shorthand for a validation failure on `channel`
    pub fn validation(channel: impl Into<String>, reason: &'static str) -> Self {
        Self::Validation {
            channel: channel.into(),
            reason,
        }
    }

    /// Shorthand for an invalid configuration
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// True for errors caused by a single bad sample
    ///
    /// Streaming callers skip these samples and continue.
    pub fn is_sample_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::DimensionMismatch { .. } | Self::UnknownChannel { .. }
        )
    }
}
