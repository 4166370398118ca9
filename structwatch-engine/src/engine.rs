//! Detection engine
//!
//! Owns the channel layout, the optional threshold detector and the fitted
//! state shared by every classification. Fitted state is swapped as a whole:
//! `fit` builds a complete [`FittedState`] off to the side and installs it
//! under a short write lock, while `classify` only holds the read lock long
//! enough to clone an `Arc`.

use std::sync::Arc;

use parking_lot::RwLock;

use structwatch_core::{
    ChannelSet, DetectionError, DetectionResult, Detector, DetectorKind, Finding, NormalizationStats,
    Normalizer, Observation, Sample, ThresholdDetector, Verdict,
};
use structwatch_ml::{DetectorConfig, ModelState, StatisticalDetector};

use crate::config::EngineConfig;

/// Lifecycle of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// No reference batch has been fitted yet
    Unfit,
    /// Normalization (and the model, if enabled) is available
    Fit,
}

/// Everything learned from one reference batch
#[derive(Debug)]
struct FittedState {
    stats: NormalizationStats,
    model: Option<ModelState>,
}

/// Combines rule-based and statistical detection over one channel layout
///
/// `DetectionEngine` is `Send + Sync`; wrap it in an `Arc` to classify from
/// several threads while another thread refits.
///
/// ```rust
/// use structwatch_core::{ChannelBounds, ChannelSet, DetectorKind, Sample};
/// use structwatch_engine::{DetectionEngine, EngineConfig};
///
/// let config = EngineConfig::new(ChannelSet::new(["strain", "acceleration"])?)
///     .with_bounds("strain", ChannelBounds::range(0.9, 1.1))
///     .with_bounds("acceleration", ChannelBounds::symmetric(0.4))
///     .with_detectors([DetectorKind::Threshold]);
///
/// let engine = DetectionEngine::new(config)?;
///
/// let verdict = engine.classify(&Sample::new(0).with("strain", 1.15).with("acceleration", 0.1))?;
/// assert!(verdict.is_anomaly);
/// assert_eq!(verdict.violating_channels().collect::<Vec<_>>(), vec!["strain"]);
/// # Ok::<(), structwatch_core::DetectionError>(())
/// ```
#[derive(Debug)]
pub struct DetectionEngine {
    channels: ChannelSet,
    threshold: Option<ThresholdDetector>,
    statistical: Option<DetectorConfig>,
    state: RwLock<Option<Arc<FittedState>>>,
}

impl DetectionEngine {
    /// Validate `config` and build an unfitted engine
    pub fn new(config: EngineConfig) -> DetectionResult<Self> {
        config.validate()?;

        let threshold = config.is_enabled(DetectorKind::Threshold).then(|| {
            let mut detector = ThresholdDetector::new();
            detector.configure(config.bounds.clone());
            detector
        });
        let statistical = config
            .is_enabled(DetectorKind::Statistical)
            .then(|| config.detector_config());

        Ok(Self {
            channels: config.channels,
            threshold,
            statistical,
            state: RwLock::new(None),
        })
    }

    /// Learn normalization and, if enabled, the statistical model
    ///
    /// On error the previously fitted state stays in place.
    pub fn fit(&self, reference: &[Sample]) -> DetectionResult<()> {
        let rows = reference
            .iter()
            .map(|sample| self.channels.project(sample))
            .collect::<DetectionResult<Vec<_>>>()?;

        let stats = Normalizer::fit_values(&self.channels, &rows)?;

        let model = match &self.statistical {
            Some(config) => {
                let normalized = rows
                    .iter()
                    .map(|row| stats.transform_values(row))
                    .collect::<DetectionResult<Vec<_>>>()?;
                Some(StatisticalDetector::fit_model(&normalized, config)?)
            }
            None => None,
        };

        log::info!(
            "engine fitted on {} samples over {} channels, decision threshold {}",
            rows.len(),
            self.channels.len(),
            model
                .as_ref()
                .map_or_else(|| "n/a".to_string(), |m| format!("{:.4}", m.threshold()))
        );

        *self.state.write() = Some(Arc::new(FittedState { stats, model }));
        Ok(())
    }

    /// Classify one sample
    pub fn classify(&self, sample: &Sample) -> DetectionResult<Verdict> {
        let state = self.snapshot();
        self.classify_with(state.as_deref(), sample)
    }

    /// Classify samples in order against a single fitted state
    ///
    /// Stops at the first sample that fails.
    pub fn classify_batch(&self, samples: &[Sample]) -> DetectionResult<Vec<Verdict>> {
        let state = self.snapshot();
        samples
            .iter()
            .map(|sample| self.classify_with(state.as_deref(), sample))
            .collect()
    }

    fn snapshot(&self) -> Option<Arc<FittedState>> {
        self.state.read().clone()
    }

    fn classify_with(&self, state: Option<&FittedState>, sample: &Sample) -> DetectionResult<Verdict> {
        let raw = self.channels.project(sample)?;

        let model = match (&self.statistical, state) {
            (None, _) => None,
            (Some(_), Some(FittedState { model: Some(model), .. })) => Some(model),
            (Some(_), _) => return Err(DetectionError::NotFitted),
        };

        let normalized = state
            .map(|s| s.stats.transform_values(&raw))
            .transpose()?;

        let observation = Observation {
            timestamp: sample.timestamp,
            channels: &self.channels,
            raw: &raw,
            normalized: normalized.as_deref(),
        };

        let mut detectors: Vec<&dyn Detector> = Vec::with_capacity(2);
        if let Some(threshold) = &self.threshold {
            detectors.push(threshold);
        }
        if let Some(model) = model {
            detectors.push(model);
        }

        let findings = detectors
            .into_iter()
            .map(|detector| detector.evaluate(&observation))
            .collect::<DetectionResult<Vec<Finding>>>()?;

        let verdict = Verdict::aggregate(sample.timestamp, findings);
        log::debug!(
            "sample {} classified: anomaly={} violations={}",
            verdict.timestamp,
            verdict.is_anomaly,
            verdict.violations.len()
        );
        Ok(verdict)
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> EnginePhase {
        if self.state.read().is_some() {
            EnginePhase::Fit
        } else {
            EnginePhase::Unfit
        }
    }

    /// True once a fit has succeeded
    pub fn is_fitted(&self) -> bool {
        self.phase() == EnginePhase::Fit
    }

    /// Statistics learned by the last successful fit
    pub fn normalization_stats(&self) -> Option<NormalizationStats> {
        self.snapshot().map(|s| s.stats.clone())
    }

    /// Statistical decision threshold, if a model is fitted
    pub fn decision_threshold(&self) -> Option<f64> {
        self.snapshot()
            .and_then(|s| s.model.as_ref().map(|m| m.threshold()))
    }

    /// Channel layout every sample must match
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Detectors this engine runs
    pub fn detectors_enabled(&self) -> Vec<DetectorKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.threshold.is_some() {
            kinds.push(DetectorKind::Threshold);
        }
        if self.statistical.is_some() {
            kinds.push(DetectorKind::Statistical);
        }
        kinds
    }
}
