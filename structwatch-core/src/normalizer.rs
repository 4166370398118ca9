//! Per-channel standardization
//!
//! The normalizer learns a mean and a population standard deviation for every
//! channel of a reference batch and rescales samples to zero mean and unit
//! variance. The statistical detector works on these rescaled values so that
//! a strain gauge reading in microstrain and an accelerometer reading in g
//! carry comparable weight.
//!
//! ## Degenerate Channels
//!
//! If every reference value of a channel is identical, its standard deviation
//! is zero and the channel carries no discriminative signal. Such channels
//! transform to `0.0` instead of dividing by zero.

use serde::{Deserialize, Serialize};

use crate::errors::{DetectionError, DetectionResult};
use crate::sample::{ChannelSet, Sample};

/// Minimum reference batch size for variance estimation
pub const MIN_REFERENCE_SAMPLES: usize = 2;

/// Learned per-channel mean and standard deviation
///
/// Immutable once fitted; a new fit produces a new value. Deserialization
/// checks that there is one finite mean and one finite, non-negative standard
/// deviation per channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredStats")]
pub struct NormalizationStats {
    channels: ChannelSet,
    means: Vec<f64>,
    std_devs: Vec<f64>,
    samples: usize,
}

/// Unchecked wire form of [`NormalizationStats`]
#[derive(Deserialize)]
struct StoredStats {
    channels: ChannelSet,
    means: Vec<f64>,
    std_devs: Vec<f64>,
    samples: usize,
}

impl TryFrom<StoredStats> for NormalizationStats {
    type Error = DetectionError;

    fn try_from(stored: StoredStats) -> Result<Self, Self::Error> {
        let width = stored.channels.len();
        for len in [stored.means.len(), stored.std_devs.len()] {
            if len != width {
                return Err(DetectionError::DimensionMismatch {
                    expected: width,
                    actual: len,
                });
            }
        }

        let names = stored.channels.names();
        for (i, (mean, std_dev)) in stored.means.iter().zip(&stored.std_devs).enumerate() {
            if !mean.is_finite() {
                return Err(DetectionError::validation(names[i].as_str(), "mean is not finite"));
            }
            if !std_dev.is_finite() || *std_dev < 0.0 {
                return Err(DetectionError::validation(
                    names[i].as_str(),
                    "standard deviation must be finite and non-negative",
                ));
            }
        }

        Ok(Self {
            channels: stored.channels,
            means: stored.means,
            std_devs: stored.std_devs,
            samples: stored.samples,
        })
    }
}

impl NormalizationStats {
    /// Channels these statistics were fitted on
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Mean of `channel`
    pub fn mean(&self, channel: &str) -> Option<f64> {
        self.channels.index_of(channel).map(|i| self.means[i])
    }

    /// Population standard deviation of `channel`
    pub fn std_dev(&self, channel: &str) -> Option<f64> {
        self.channels.index_of(channel).map(|i| self.std_devs[i])
    }

    /// Number of reference samples used
    pub fn sample_count(&self) -> usize {
        self.samples
    }

    /// True if `channel` had zero variance in the reference batch
    pub fn is_degenerate(&self, channel: &str) -> bool {
        self.std_dev(channel).is_some_and(|s| s == 0.0)
    }

    /// Standardize a dense vector laid out in `channels()` order
    pub fn transform_values(&self, values: &[f64]) -> DetectionResult<Vec<f64>> {
        if values.len() != self.means.len() {
            return Err(DetectionError::DimensionMismatch {
                expected: self.means.len(),
                actual: values.len(),
            });
        }

        Ok(values
            .iter()
            .zip(self.means.iter().zip(&self.std_devs))
            .map(|(&value, (&mean, &std_dev))| standardize(value, mean, std_dev))
            .collect())
    }
}

fn standardize(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        0.0
    } else {
        (value - mean) / std_dev
    }
}

/// Standard score normalizer
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer;

impl Normalizer {
    /// Learn per-channel statistics from a reference batch
    pub fn fit(channels: &ChannelSet, batch: &[Sample]) -> DetectionResult<NormalizationStats> {
        let rows = batch
            .iter()
            .map(|sample| channels.project(sample))
            .collect::<DetectionResult<Vec<_>>>()?;

        Self::fit_values(channels, &rows)
    }

    /// Learn statistics from rows already flattened in `channels` order
    pub fn fit_values(channels: &ChannelSet, rows: &[Vec<f64>]) -> DetectionResult<NormalizationStats> {
        if rows.len() < MIN_REFERENCE_SAMPLES {
            return Err(DetectionError::InsufficientData {
                required: MIN_REFERENCE_SAMPLES,
                available: rows.len(),
            });
        }

        let width = channels.len();
        if let Some(row) = rows.iter().find(|row| row.len() != width) {
            return Err(DetectionError::DimensionMismatch {
                expected: width,
                actual: row.len(),
            });
        }

        let n = rows.len() as f64;
        let mut means = vec![0.0; width];
        for row in rows {
            for (mean, value) in means.iter_mut().zip(row) {
                *mean += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut std_devs = vec![0.0; width];
        let mut ranges = vec![(f64::INFINITY, f64::NEG_INFINITY); width];
        for row in rows {
            for ((min, max), &value) in ranges.iter_mut().zip(row) {
                *min = min.min(value);
                *max = max.max(value);
            }
            for ((acc, value), mean) in std_devs.iter_mut().zip(row).zip(&means) {
                *acc += (value - mean).powi(2);
            }
        }
        for (i, std_dev) in std_devs.iter_mut().enumerate() {
            *std_dev = (*std_dev / n).sqrt();
            // Constant channels can still pick up rounding noise in the mean
            let (min, max) = ranges[i];
            if min == max {
                *std_dev = 0.0;
                log::warn!(
                    "channel '{}' has zero variance in reference batch, normalizing to 0",
                    channels.names()[i]
                );
            }
        }

        Ok(NormalizationStats {
            channels: channels.clone(),
            means,
            std_devs,
            samples: rows.len(),
        })
    }

    /// Standardize one sample: `(value - mean) / std`, or `0` when `std == 0`
    pub fn transform(sample: &Sample, stats: &NormalizationStats) -> DetectionResult<Sample> {
        let values = stats.channels.project(sample)?;
        let scaled = stats.transform_values(&values)?;
        stats.channels.assemble(sample.timestamp, &scaled)
    }
}
