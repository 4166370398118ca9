use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    errors::{DetectionError, DetectionResult},
    sample::Sample,
    traits::{Detector, Observation},
    verdict::{Contribution, DetectorKind, Finding, Verdict, Violation},
};

use super::utils;

/// Inclusive `(lower, upper)` limits for one channel
///
/// Either side may be `None`, meaning unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelBounds {
    /// Readings below this are anomalous
    #[serde(default)]
    pub lower: Option<f64>,
    /// Readings above this are anomalous
    #[serde(default)]
    pub upper: Option<f64>,
}

impl ChannelBounds {
    /// Both sides bounded
    pub fn range(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Upper limit only
    pub fn upper(upper: f64) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }

    /// Lower limit only
    pub fn lower(lower: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    /// `|value| <= limit`
    pub fn symmetric(limit: f64) -> Self {
        let limit = limit.abs();
        Self::range(-limit, limit)
    }

    /// Reject NaN limits and inverted ranges
    pub fn validate(&self, channel: &str) -> DetectionResult<()> {
        let not_nan = |b: Option<f64>| b.map_or(true, |v| !v.is_nan());
        if !not_nan(self.lower) || !not_nan(self.upper) {
            return Err(DetectionError::invalid_config(format!(
                "bounds for '{}' contain NaN",
                channel
            )));
        }
        if let (Some(lower), Some(upper)) = (self.lower, self.upper) {
            if lower > upper {
                return Err(DetectionError::invalid_config(format!(
                    "lower bound {} exceeds upper bound {} for '{}'",
                    lower, upper, channel
                )));
            }
        }
        Ok(())
    }
}

/// Rule-based detector over static per-channel bounds
///
/// Needs no fitting. A sample is anomalous if any bounded channel crosses
/// either of its limits, and every crossing is reported, not just the first.
///
/// ```rust
/// use structwatch_core::{ChannelBounds, Sample, ThresholdDetector};
///
/// let detector = ThresholdDetector::new()
///     .with_bounds("strain", ChannelBounds::upper(120.0))
///     .with_bounds("temperature", ChannelBounds::upper(40.0));
///
/// let verdict = detector
///     .classify(&Sample::new(0).with("strain", 131.0).with("temperature", 42.5))
///     .unwrap();
///
/// assert!(verdict.is_anomaly);
/// assert_eq!(verdict.violating_channels().count(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdDetector {
    bounds: BTreeMap<String, ChannelBounds>,
}

impl ThresholdDetector {
    /// Detector with no bounds; flags nothing until configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Strain gauge ratio and accelerometer limits used by the real-time rig
    ///
    /// Strain must stay within `[0.9, 1.1]` and acceleration within `±0.4`.
    pub fn strain_gauge_rig() -> Self {
        Self::new()
            .with_bounds("strain", ChannelBounds::range(0.9, 1.1))
            .with_bounds("acceleration", ChannelBounds::symmetric(0.4))
    }

    /// Replace all configured bounds
    pub fn configure(&mut self, bounds: BTreeMap<String, ChannelBounds>) {
        self.bounds = bounds;
    }

    /// Builder-style bound for one channel
    pub fn with_bounds(mut self, channel: impl Into<String>, bounds: ChannelBounds) -> Self {
        self.bounds.insert(channel.into(), bounds);
        self
    }

    /// Configured bounds, by channel name
    pub fn bounds(&self) -> &BTreeMap<String, ChannelBounds> {
        &self.bounds
    }

    /// Check every configured bound for sanity
    pub fn validate(&self) -> DetectionResult<()> {
        self.bounds
            .iter()
            .try_for_each(|(channel, bounds)| bounds.validate(channel))
    }

    /// Classify one sample against the configured bounds
    pub fn classify(&self, sample: &Sample) -> DetectionResult<Verdict> {
        let finding = self.check(|channel| sample.get(channel))?;
        Ok(Verdict::aggregate(sample.timestamp, [finding]))
    }

    fn check(&self, lookup: impl Fn(&str) -> Option<f64>) -> DetectionResult<Finding> {
        let mut violations = Vec::new();

        for (channel, bounds) in &self.bounds {
            let value = lookup(channel).ok_or_else(|| DetectionError::UnknownChannel {
                channel: channel.clone(),
            })?;
            if !value.is_finite() {
                return Err(DetectionError::validation(channel.as_str(), "reading is not finite"));
            }

            if let Some(bound) = utils::check_bounds(value, bounds.lower, bounds.upper) {
                violations.push(Violation {
                    channel: channel.clone(),
                    value,
                    bound,
                });
            }
        }

        Ok(Finding {
            kind: DetectorKind::Threshold,
            contribution: Contribution {
                flagged: !violations.is_empty(),
                score: None,
            },
            violations,
        })
    }
}

impl Detector for ThresholdDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Threshold
    }

    fn evaluate(&self, observation: &Observation<'_>) -> DetectionResult<Finding> {
        self.check(|channel| observation.raw_value(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::BoundViolation;
    use proptest::prelude::*;

    fn bridge_detector() -> ThresholdDetector {
        ThresholdDetector::new()
            .with_bounds("strain", ChannelBounds::upper(120.0))
            .with_bounds("temperature", ChannelBounds::upper(40.0))
            .with_bounds("vibration", ChannelBounds::upper(0.05))
    }

    fn reading(strain: f64, temperature: f64, vibration: f64) -> Sample {
        Sample::new(0)
            .with("strain", strain)
            .with("temperature", temperature)
            .with("vibration", vibration)
    }

    #[test]
    fn normal_reading_passes() {
        let verdict = bridge_detector().classify(&reading(100.0, 25.0, 0.02)).unwrap();
        assert!(!verdict.is_anomaly);
        assert!(verdict.violations.is_empty());
        assert!(!verdict.flagged_by(DetectorKind::Threshold));
    }

    #[test]
    fn every_violation_is_reported() {
        let verdict = bridge_detector().classify(&reading(130.0, 25.0, 0.07)).unwrap();
        assert!(verdict.is_anomaly);

        let channels: Vec<_> = verdict.violating_channels().collect();
        assert_eq!(channels, vec!["strain", "vibration"]);
        assert_eq!(verdict.violations[0].bound, BoundViolation::Above(120.0));
    }

    #[test]
    fn rig_preset_matches_realtime_rule() {
        let rig = ThresholdDetector::strain_gauge_rig();
        let ok = Sample::new(0).with("strain", 1.0).with("acceleration", -0.39);
        let low_strain = Sample::new(0).with("strain", 0.85).with("acceleration", 0.0);
        let shaking = Sample::new(0).with("strain", 1.0).with("acceleration", -0.45);

        assert!(!rig.classify(&ok).unwrap().is_anomaly);
        assert!(rig.classify(&low_strain).unwrap().is_anomaly);
        assert_eq!(
            rig.classify(&shaking).unwrap().violations[0].bound,
            BoundViolation::Below(-0.4)
        );
    }

    #[test]
    fn unbounded_channels_are_ignored() {
        let detector = ThresholdDetector::new().with_bounds("strain", ChannelBounds::upper(120.0));
        let verdict = detector.classify(&reading(100.0, 500.0, 9.0)).unwrap();
        assert!(!verdict.is_anomaly);
    }

    #[test]
    fn missing_bounded_channel_is_unknown() {
        let sample = Sample::new(0).with("strain", 100.0).with("temperature", 20.0);
        let err = bridge_detector().classify(&sample).unwrap_err();
        assert_eq!(err, DetectionError::UnknownChannel { channel: "vibration".into() });
    }

    #[test]
    fn non_finite_reading_is_rejected() {
        let detector = ThresholdDetector::new().with_bounds("strain", ChannelBounds::upper(120.0));
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                detector.classify(&Sample::new(0).with("strain", value)).unwrap_err(),
                DetectionError::validation("strain", "reading is not finite")
            );
        }
    }

    #[test]
    fn nan_bounds_rejected() {
        let detector = ThresholdDetector::new().with_bounds(
            "strain",
            ChannelBounds { lower: Some(f64::NAN), upper: None },
        );
        assert!(matches!(detector.validate(), Err(DetectionError::InvalidConfig { .. })));
        // Infinite limits are legal and behave as open sides
        assert!(ThresholdDetector::new()
            .with_bounds("strain", ChannelBounds::range(f64::NEG_INFINITY, f64::INFINITY))
            .validate()
            .is_ok());
    }

    #[test]
    fn configure_replaces_bounds() {
        let mut detector = bridge_detector();
        detector.configure(BTreeMap::from([("strain".to_string(), ChannelBounds::lower(90.0))]));
        assert_eq!(detector.bounds().len(), 1);
        assert!(detector.classify(&Sample::new(0).with("strain", 80.0)).unwrap().is_anomaly);
    }

    #[test]
    fn inverted_bounds_rejected() {
        let detector = ThresholdDetector::new().with_bounds("strain", ChannelBounds::range(5.0, 1.0));
        assert!(matches!(detector.validate(), Err(DetectionError::InvalidConfig { .. })));
        assert!(bridge_detector().validate().is_ok());
    }

    proptest! {
        #[test]
        fn within_bounds_never_flags(
            strain in 0.0f64..=120.0,
            temperature in -40.0f64..=40.0,
            vibration in 0.0f64..=0.05,
        ) {
            let verdict = bridge_detector().classify(&reading(strain, temperature, vibration)).unwrap();
            prop_assert!(!verdict.is_anomaly);
        }

        #[test]
        fn above_upper_is_reported(excess in 1.0e-6f64..1.0e6, temperature in -40.0f64..=40.0) {
            let verdict = bridge_detector().classify(&reading(120.0 + excess, temperature, 0.01)).unwrap();
            prop_assert!(verdict.is_anomaly);
            prop_assert!(verdict.violating_channels().any(|c| c == "strain"));
        }
    }
}
