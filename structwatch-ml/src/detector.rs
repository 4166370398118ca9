//! Statistical detector built on the Isolation Forest
//!
//! [`StatisticalDetector::fit_model`] grows a forest on a normalized
//! reference batch and calibrates a decision threshold so that roughly
//! `contamination` of the reference batch scores at or above it. The result is
//! an immutable [`ModelState`] that scores and classifies new samples.

use serde::{Deserialize, Serialize};

use structwatch_core::{
    Contribution, DetectionError, DetectionResult, Detector, DetectorKind, Finding, Observation,
};

use crate::{quantile, ForestConfig, ForestStats, IsolationForest};

/// Default expected anomaly fraction
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Configuration for the statistical detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DetectorConfig {
    /// Expected fraction of anomalies in the reference batch, in `(0, 1)`
    pub contamination: f64,
    /// Seed for reproducible partitioning; `None` draws one from the OS
    pub random_seed: Option<u64>,
    /// Number of trees in the ensemble
    pub num_trees: usize,
    /// Per-tree subsample size
    pub sample_size: usize,
    /// Depth limit; `None` uses `ceil(log2(sample_size))`
    pub max_depth: Option<u32>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let forest = ForestConfig::default();
        Self {
            contamination: DEFAULT_CONTAMINATION,
            random_seed: forest.seed,
            num_trees: forest.num_trees,
            sample_size: forest.sample_size,
            max_depth: forest.max_depth,
        }
    }
}

impl DetectorConfig {
    /// Default configuration with the given contamination and seed
    pub fn new(contamination: f64, random_seed: Option<u64>) -> Self {
        Self {
            contamination,
            random_seed,
            ..Self::default()
        }
    }

    /// Forest shape derived from this configuration
    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            num_trees: self.num_trees,
            sample_size: self.sample_size,
            max_depth: self.max_depth,
            seed: self.random_seed,
        }
    }

    /// Check every parameter is within range
    pub fn validate(&self) -> DetectionResult<()> {
        if !(self.contamination > 0.0 && self.contamination < 1.0) {
            return Err(DetectionError::invalid_config(format!(
                "contamination must be in (0, 1), got {}",
                self.contamination
            )));
        }
        self.forest_config().validate()
    }
}

/// Fitted forest plus its calibrated decision threshold
///
/// Immutable after fit. Sharing it between threads only needs `&`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelState {
    forest: IsolationForest,
    threshold: f64,
    contamination: f64,
}

impl ModelState {
    /// Anomaly score, higher is more anomalous
    pub fn score(&self, sample: &[f64]) -> DetectionResult<f64> {
        Ok(self.forest.anomaly_score(sample)?.score)
    }

    /// `score >= threshold`
    pub fn classify(&self, sample: &[f64]) -> DetectionResult<bool> {
        Ok(self.score(sample)? >= self.threshold)
    }

    /// Calibrated decision threshold on the score
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Contamination the threshold was calibrated for
    pub fn contamination(&self) -> f64 {
        self.contamination
    }

    /// Dimensionality of accepted samples
    pub fn num_features(&self) -> usize {
        self.forest.num_features()
    }

    /// Underlying forest statistics
    pub fn forest_stats(&self) -> ForestStats {
        self.forest.stats()
    }
}

impl Detector for ModelState {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Statistical
    }

    fn evaluate(&self, observation: &Observation<'_>) -> DetectionResult<Finding> {
        let normalized = observation.normalized.ok_or(DetectionError::NotFitted)?;
        let score = self.score(normalized)?;

        Ok(Finding {
            kind: DetectorKind::Statistical,
            contribution: Contribution {
                flagged: score >= self.threshold,
                score: Some(score),
            },
            violations: Vec::new(),
        })
    }
}

/// Unsupervised outlier detector over normalized samples
///
/// ```rust
/// use structwatch_ml::{DetectorConfig, StatisticalDetector};
///
/// let reference: Vec<Vec<f64>> = (0..200)
///     .map(|i| vec![((i % 20) as f64 - 10.0) / 6.0, ((i / 20) as f64 - 5.0) / 3.0])
///     .collect();
///
/// let mut detector = StatisticalDetector::new(DetectorConfig::new(0.05, Some(42)));
/// detector.fit(&reference).unwrap();
///
/// let outlier = detector.score(&[9.0, 9.0]).unwrap();
/// let typical = detector.score(&[0.0, 0.0]).unwrap();
/// assert!(outlier > typical);
/// ```
#[derive(Debug, Clone)]
pub struct StatisticalDetector {
    config: DetectorConfig,
    state: Option<ModelState>,
}

impl StatisticalDetector {
    /// Unfitted detector
    pub fn new(config: DetectorConfig) -> Self {
        Self { config, state: None }
    }

    /// Grow a forest and calibrate its threshold on a normalized batch
    pub fn fit_model(normalized_batch: &[Vec<f64>], config: &DetectorConfig) -> DetectionResult<ModelState> {
        config.validate()?;

        let forest = IsolationForest::fit(normalized_batch, &config.forest_config())?;

        let reference_scores: Vec<f64> = forest
            .predict(normalized_batch)?
            .iter()
            .map(|s| s.score)
            .collect();
        let threshold = quantile(&reference_scores, 1.0 - config.contamination)
            .ok_or(DetectionError::InsufficientData {
                required: 2,
                available: 0,
            })?;

        let stats = forest.stats();
        log::info!(
            "isolation forest fitted: {} trees, {} of {} samples per tree, threshold {:.4}",
            stats.num_trees,
            stats.sample_size,
            stats.num_samples,
            threshold
        );

        Ok(ModelState {
            forest,
            threshold,
            contamination: config.contamination,
        })
    }

    /// Fit on `normalized_batch`, replacing any previous model
    ///
    /// On failure the previous model, if any, is kept.
    pub fn fit(&mut self, normalized_batch: &[Vec<f64>]) -> DetectionResult<&ModelState> {
        let state = Self::fit_model(normalized_batch, &self.config)?;
        Ok(self.state.insert(state))
    }

    /// Fitted model, if any
    pub fn state(&self) -> Option<&ModelState> {
        self.state.as_ref()
    }

    /// Configuration in use
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Anomaly score of a normalized sample
    pub fn score(&self, sample: &[f64]) -> DetectionResult<f64> {
        self.fitted()?.score(sample)
    }

    /// True if the sample scores at or above the fitted threshold
    pub fn classify(&self, sample: &[f64]) -> DetectionResult<bool> {
        self.fitted()?.classify(sample)
    }

    fn fitted(&self) -> DetectionResult<&ModelState> {
        self.state.as_ref().ok_or(DetectionError::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use structwatch_core::ChannelSet;

    /// Deterministic two-channel grid centred on the origin
    fn reference() -> Vec<Vec<f64>> {
        (0..400)
            .map(|i| {
                let a = ((i % 20) as f64 - 9.5) / 5.8;
                let b = ((i / 20) as f64 - 9.5) / 5.8;
                vec![a, b]
            })
            .collect()
    }

    #[test]
    fn not_fitted_before_fit() {
        let detector = StatisticalDetector::new(DetectorConfig::default());
        assert_eq!(detector.score(&[0.0, 0.0]), Err(DetectionError::NotFitted));
        assert_eq!(detector.classify(&[0.0, 0.0]), Err(DetectionError::NotFitted));
        assert!(detector.state().is_none());
    }

    #[test]
    fn far_outlier_is_flagged_and_centre_is_not() {
        let mut detector = StatisticalDetector::new(DetectorConfig::new(0.1, Some(42)));
        detector.fit(&reference()).unwrap();

        assert!(detector.classify(&[8.0, -8.0]).unwrap());
        assert!(!detector.classify(&[0.0, 0.0]).unwrap());
        assert!(detector.score(&[8.0, -8.0]).unwrap() > detector.score(&[0.0, 0.0]).unwrap());
    }

    #[test]
    fn threshold_matches_contamination() {
        let data = reference();
        let state = StatisticalDetector::fit_model(&data, &DetectorConfig::new(0.1, Some(5))).unwrap();

        let flagged = data.iter().filter(|s| state.classify(s).unwrap()).count();
        let fraction = flagged as f64 / data.len() as f64;
        // Quantile calibration flags about 10% of the reference batch; ties
        // at the threshold can only add to it
        assert!(fraction >= 0.09, "flagged fraction {}", fraction);
        assert!(fraction <= 0.2, "flagged fraction {}", fraction);
        assert_eq!(state.contamination(), 0.1);
    }

    #[test]
    fn same_seed_same_classifications() {
        let data = reference();
        let config = DetectorConfig::new(0.05, Some(1234));
        let held_out = [[2.1, -0.3], [0.2, 0.2], [-1.9, 1.9], [4.0, 0.0]];

        let first = StatisticalDetector::fit_model(&data, &config).unwrap();
        for _ in 0..3 {
            let again = StatisticalDetector::fit_model(&data, &config).unwrap();
            assert_eq!(again.threshold(), first.threshold());
            for sample in &held_out {
                assert_eq!(again.classify(sample).unwrap(), first.classify(sample).unwrap());
                assert_eq!(again.score(sample).unwrap(), first.score(sample).unwrap());
            }
        }
    }

    #[test]
    fn invalid_contamination_rejected() {
        for contamination in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let config = DetectorConfig::new(contamination, Some(1));
            assert!(matches!(
                StatisticalDetector::fit_model(&reference(), &config),
                Err(DetectionError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn failed_refit_keeps_previous_model() {
        let mut detector = StatisticalDetector::new(DetectorConfig::new(0.05, Some(9)));
        let threshold = detector.fit(&reference()).unwrap().threshold();

        let err = detector.fit(&[vec![0.0, 0.0]]).unwrap_err();
        assert_eq!(err, DetectionError::InsufficientData { required: 2, available: 1 });
        assert_eq!(detector.state().unwrap().threshold(), threshold);
    }

    #[test]
    fn evaluate_requires_normalized_values() {
        let state = StatisticalDetector::fit_model(&reference(), &DetectorConfig::new(0.05, Some(2))).unwrap();
        let channels = ChannelSet::new(["a", "b"]).unwrap();

        let raw = [0.0, 0.0];
        let without = Observation { timestamp: 0, channels: &channels, raw: &raw, normalized: None };
        assert_eq!(state.evaluate(&without), Err(DetectionError::NotFitted));

        let with = Observation { timestamp: 0, channels: &channels, raw: &raw, normalized: Some(&raw) };
        let finding = state.evaluate(&with).unwrap();
        assert_eq!(finding.kind, DetectorKind::Statistical);
        assert!(finding.contribution.score.is_some());
        assert!(finding.violations.is_empty());
    }
}
