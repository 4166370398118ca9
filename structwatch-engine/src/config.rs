//! Engine configuration
//!
//! [`EngineConfig`] is the single configuration surface of the engine. It
//! derives serde traits so deployments can keep it in a JSON file next to the
//! acquisition setup:
//!
//! ```json
//! {
//!   "channels": ["strain", "acceleration"],
//!   "bounds": {
//!     "strain": { "lower": 0.9, "upper": 1.1 },
//!     "acceleration": { "lower": -0.4, "upper": 0.4 }
//!   },
//!   "detectors_enabled": ["threshold", "statistical"],
//!   "contamination": 0.05,
//!   "random_seed": 42
//! }
//! ```
//!
//! Every field except `channels` has a default.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use structwatch_core::{ChannelBounds, ChannelSet, DetectionError, DetectionResult, DetectorKind};
use structwatch_ml::{DetectorConfig, DEFAULT_CONTAMINATION, DEFAULT_NUM_TREES, DEFAULT_SAMPLE_SIZE};

/// Errors raised while loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// JSON could not be parsed into a configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Parsed configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] DetectionError),
}

/// Full configuration of a [`crate::DetectionEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Channels every sample must carry, in feature layout order
    pub channels: ChannelSet,

    /// Static bounds per channel for the threshold detector
    #[serde(default)]
    pub bounds: BTreeMap<String, ChannelBounds>,

    /// Which detectors run
    #[serde(default = "default_detectors")]
    pub detectors_enabled: BTreeSet<DetectorKind>,

    /// Expected fraction of anomalies in the reference batch
    #[serde(default = "default_contamination")]
    pub contamination: f64,

    /// Seed for reproducible statistical fits
    #[serde(default = "default_seed")]
    pub random_seed: Option<u64>,

    /// Trees in the Isolation Forest
    #[serde(default = "default_num_trees")]
    pub num_trees: usize,

    /// Per-tree subsample size
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Tree depth limit, `None` for `ceil(log2(sample_size))`
    #[serde(default)]
    pub max_depth: Option<u32>,
}

fn default_detectors() -> BTreeSet<DetectorKind> {
    BTreeSet::from([DetectorKind::Threshold, DetectorKind::Statistical])
}

fn default_contamination() -> f64 {
    DEFAULT_CONTAMINATION
}

fn default_seed() -> Option<u64> {
    Some(42)
}

fn default_num_trees() -> usize {
    DEFAULT_NUM_TREES
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

/// Vibration, strain and displacement channels with both detectors enabled
impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(ChannelSet::default())
    }
}

impl EngineConfig {
    /// Both detectors, no bounds, default forest
    pub fn new(channels: ChannelSet) -> Self {
        Self {
            channels,
            bounds: BTreeMap::new(),
            detectors_enabled: default_detectors(),
            contamination: default_contamination(),
            random_seed: default_seed(),
            num_trees: default_num_trees(),
            sample_size: default_sample_size(),
            max_depth: None,
        }
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Add static bounds for one channel
    pub fn with_bounds(mut self, channel: impl Into<String>, bounds: ChannelBounds) -> Self {
        self.bounds.insert(channel.into(), bounds);
        self
    }

    /// Run only the listed detectors
    pub fn with_detectors(mut self, detectors: impl IntoIterator<Item = DetectorKind>) -> Self {
        self.detectors_enabled = detectors.into_iter().collect();
        self
    }

    /// Set contamination
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = contamination;
        self
    }

    /// Set or clear the random seed
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.random_seed = seed;
        self
    }

    /// True if `kind` is enabled
    pub fn is_enabled(&self, kind: DetectorKind) -> bool {
        self.detectors_enabled.contains(&kind)
    }

    /// Statistical detector parameters
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            contamination: self.contamination,
            random_seed: self.random_seed,
            num_trees: self.num_trees,
            sample_size: self.sample_size,
            max_depth: self.max_depth,
        }
    }

    /// Check the configuration is internally consistent
    pub fn validate(&self) -> DetectionResult<()> {
        if self.detectors_enabled.is_empty() {
            return Err(DetectionError::invalid_config("at least one detector must be enabled"));
        }

        for (channel, bounds) in &self.bounds {
            if !self.channels.contains(channel) {
                return Err(DetectionError::UnknownChannel {
                    channel: channel.clone(),
                });
            }
            bounds.validate(channel)?;
        }

        if self.is_enabled(DetectorKind::Statistical) {
            self.detector_config().validate()?;
        }

        if !self.is_enabled(DetectorKind::Threshold) && !self.bounds.is_empty() {
            log::warn!("bounds configured but threshold detector is disabled, bounds are ignored");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIG_JSON: &str = r#"{
        "channels": ["strain", "acceleration"],
        "bounds": {
            "strain": { "lower": 0.9, "upper": 1.1 },
            "acceleration": { "lower": -0.4, "upper": 0.4 }
        },
        "detectors_enabled": ["threshold"]
    }"#;

    #[test]
    fn parses_with_defaults() {
        let config = EngineConfig::from_json(RIG_JSON).unwrap();

        assert_eq!(config.channels.names(), &["strain".to_string(), "acceleration".to_string()]);
        assert_eq!(config.bounds["strain"], ChannelBounds::range(0.9, 1.1));
        assert!(config.is_enabled(DetectorKind::Threshold));
        assert!(!config.is_enabled(DetectorKind::Statistical));
        assert_eq!(config.contamination, 0.05);
        assert_eq!(config.random_seed, Some(42));
        assert_eq!(config.num_trees, 100);
    }

    #[test]
    fn json_round_trip() {
        let config = EngineConfig::new(ChannelSet::new(["strain", "vibration"]).unwrap())
            .with_bounds("strain", ChannelBounds::upper(120.0))
            .with_seed(None);

        let parsed = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn bounds_for_unknown_channel_rejected() {
        let json = r#"{ "channels": ["strain"], "bounds": { "tilt": { "upper": 2.0 } } }"#;
        match EngineConfig::from_json(json) {
            Err(ConfigError::Invalid(DetectionError::UnknownChannel { channel })) => {
                assert_eq!(channel, "tilt")
            }
            other => panic!("expected unknown channel, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_values() {
        let bad_contamination = r#"{ "channels": ["strain"], "contamination": 1.5 }"#;
        assert!(matches!(
            EngineConfig::from_json(bad_contamination),
            Err(ConfigError::Invalid(DetectionError::InvalidConfig { .. }))
        ));

        let no_detectors = r#"{ "channels": ["strain"], "detectors_enabled": [] }"#;
        assert!(matches!(
            EngineConfig::from_json(no_detectors),
            Err(ConfigError::Invalid(DetectionError::InvalidConfig { .. }))
        ));

        let duplicate = r#"{ "channels": ["strain", "strain"] }"#;
        assert!(matches!(EngineConfig::from_json(duplicate), Err(ConfigError::Parse(_))));

        let typo = r#"{ "channels": ["strain"], "contaminaton": 0.1 }"#;
        assert!(matches!(EngineConfig::from_json(typo), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn default_is_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.channels.len(), 3);
        assert!(config.channels.contains("displacement"));
        assert!(config.bounds.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn contamination_ignored_when_statistical_disabled() {
        let config = EngineConfig::new(ChannelSet::new(["strain"]).unwrap())
            .with_detectors([DetectorKind::Threshold])
            .with_contamination(0.0);
        assert!(config.validate().is_ok());
    }
}
