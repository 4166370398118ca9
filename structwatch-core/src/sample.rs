//! Samples and channel sets
//!
//! A [`Sample`] is one multi-channel reading taken at a point in time. A
//! [`ChannelSet`] fixes which channels an engine expects and in which order
//! they are laid out when a sample is flattened into a dense feature vector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{DetectionError, DetectionResult};

/// Timestamp in milliseconds (wall clock or sample index, caller's choice)
pub type Timestamp = u64;

/// One reading per channel, keyed by channel name
///
/// ```rust
/// use structwatch_core::Sample;
///
/// let sample = Sample::new(1_000)
///     .with("strain", 1.02)
///     .with("acceleration", -0.12);
///
/// assert_eq!(sample.get("strain"), Some(1.02));
/// assert_eq!(sample.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    /// When the reading was taken
    pub timestamp: Timestamp,
    /// Reading per channel
    pub readings: BTreeMap<String, f64>,
}

impl Sample {
    /// Empty sample at `timestamp`
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            readings: BTreeMap::new(),
        }
    }

    /// Build a sample from `(channel, value)` pairs
    pub fn from_pairs<I, K>(timestamp: Timestamp, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            timestamp,
            readings: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, channel: impl Into<String>, value: f64) -> Self {
        self.insert(channel, value);
        self
    }

    /// Set the reading for `channel`, replacing any previous value
    pub fn insert(&mut self, channel: impl Into<String>, value: f64) {
        self.readings.insert(channel.into(), value);
    }

    /// Reading for `channel`, if present
    pub fn get(&self, channel: &str) -> Option<f64> {
        self.readings.get(channel).copied()
    }

    /// Number of channels carried by this sample
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// True if the sample carries no readings
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Iterate `(channel, value)` pairs in channel-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.readings.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Ordered, duplicate-free set of channel names
///
/// Channel order defines the layout of dense feature vectors. Equality of
/// channel sets between fit and classify is by name, not by order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ChannelSet {
    names: Vec<String>,
}

impl ChannelSet {
    /// Create a channel set, rejecting empty sets and duplicate names
    pub fn new<I, S>(names: I) -> DetectionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if name.is_empty() {
                return Err(DetectionError::invalid_config("channel names must be non-empty"));
            }
            if seen.contains(&name) {
                return Err(DetectionError::invalid_config(format!(
                    "duplicate channel '{}'",
                    name
                )));
            }
            seen.push(name);
        }

        if seen.is_empty() {
            return Err(DetectionError::invalid_config("at least one channel is required"));
        }

        Ok(Self { names: seen })
    }

    /// Channel names in layout order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed set
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of `channel` in the layout
    pub fn index_of(&self, channel: &str) -> Option<usize> {
        self.names.iter().position(|n| n == channel)
    }

    /// True if `channel` belongs to the set
    pub fn contains(&self, channel: &str) -> bool {
        self.index_of(channel).is_some()
    }

    /// Same channels regardless of order
    pub fn same_channels(&self, other: &ChannelSet) -> bool {
        self.len() == other.len() && self.names.iter().all(|n| other.contains(n))
    }

    /// Flatten `sample` into a dense vector in layout order
    ///
    /// Fails if a channel is missing, if a reading is NaN or infinite, or if
    /// the sample carries a channel outside the set.
    pub fn project(&self, sample: &Sample) -> DetectionResult<Vec<f64>> {
        let mut values = Vec::with_capacity(self.names.len());

        for name in &self.names {
            let value = sample
                .get(name)
                .ok_or_else(|| DetectionError::validation(name.as_str(), "missing reading"))?;
            if !value.is_finite() {
                return Err(DetectionError::validation(name.as_str(), "reading is not finite"));
            }
            values.push(value);
        }

        if sample.len() != self.names.len() {
            if let Some((extra, _)) = sample.iter().find(|(name, _)| !self.contains(name)) {
                return Err(DetectionError::validation(extra, "channel not configured"));
            }
        }

        Ok(values)
    }

    /// Rebuild a sample from a dense vector laid out in this set's order
    pub fn assemble(&self, timestamp: Timestamp, values: &[f64]) -> DetectionResult<Sample> {
        if values.len() != self.names.len() {
            return Err(DetectionError::DimensionMismatch {
                expected: self.names.len(),
                actual: values.len(),
            });
        }

        Ok(Sample::from_pairs(
            timestamp,
            self.names.iter().cloned().zip(values.iter().copied()),
        ))
    }
}

/// `vibration`, `strain`, `displacement`
impl Default for ChannelSet {
    fn default() -> Self {
        Self {
            names: ["vibration", "strain", "displacement"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl TryFrom<Vec<String>> for ChannelSet {
    type Error = DetectionError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<ChannelSet> for Vec<String> {
    fn from(set: ChannelSet) -> Self {
        set.names
    }
}
