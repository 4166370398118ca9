//! Shared detector capability
//!
//! Both detection strategies implement [`Detector`]. The engine builds an
//! [`Observation`] once per sample and hands it to every active detector, then
//! folds the resulting findings into a [`crate::Verdict`].

use crate::errors::DetectionResult;
use crate::sample::{ChannelSet, Timestamp};
use crate::verdict::{DetectorKind, Finding};

/// A validated sample, flattened in channel-set order
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    /// Sample timestamp
    pub timestamp: Timestamp,
    /// Layout of `raw` and `normalized`
    pub channels: &'a ChannelSet,
    /// Raw readings
    pub raw: &'a [f64],
    /// Normalized readings, present once normalization statistics exist
    pub normalized: Option<&'a [f64]>,
}

impl<'a> Observation<'a> {
    /// Raw reading of `channel`
    pub fn raw_value(&self, channel: &str) -> Option<f64> {
        self.channels.index_of(channel).and_then(|i| self.raw.get(i).copied())
    }
}

/// Core detector trait - implemented by each detection strategy
pub trait Detector {
    /// Which strategy this is
    fn kind(&self) -> DetectorKind;

    /// Evaluate one observation
    ///
    /// Must not mutate any fitted state.
    fn evaluate(&self, observation: &Observation<'_>) -> DetectionResult<Finding>;
}
