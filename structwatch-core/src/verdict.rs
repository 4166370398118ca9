//! Per-sample detection outcomes
//!
//! A [`Verdict`] is what the engine hands back to presentation or persistence
//! collaborators. It never formats itself for display beyond `Debug`; callers
//! decide how to log, plot or store it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sample::Timestamp;

/// Which detector produced a contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorKind {
    /// Static per-channel bounds
    Threshold,
    /// Isolation Forest scoring
    Statistical,
}

impl DetectorKind {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Statistical => "statistical",
        }
    }
}

/// One detector's opinion about one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    /// Did this detector flag the sample
    pub flagged: bool,
    /// Anomaly score, for detectors that produce one
    pub score: Option<f64>,
}

/// Side of a bound that was crossed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "side", content = "limit", rename_all = "lowercase")]
pub enum BoundViolation {
    /// Reading fell below the lower bound
    Below(f64),
    /// Reading rose above the upper bound
    Above(f64),
}

/// A channel that crossed one of its bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Offending channel
    pub channel: String,
    /// Raw reading
    pub value: f64,
    /// Which bound was crossed
    pub bound: BoundViolation,
}

/// Output of a single detector for one sample
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Detector that produced this finding
    pub kind: DetectorKind,
    /// Flag and optional score
    pub contribution: Contribution,
    /// Channels that crossed static bounds (threshold detector only)
    pub violations: Vec<Violation>,
}

/// Aggregated classification of one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Timestamp of the classified sample
    pub timestamp: Timestamp,
    /// True if any active detector flagged the sample
    pub is_anomaly: bool,
    /// Individual detector outcomes
    pub contributions: BTreeMap<DetectorKind, Contribution>,
    /// Every channel that crossed a static bound
    pub violations: Vec<Violation>,
}

impl Verdict {
    /// Combine detector findings with logical OR
    pub fn aggregate(timestamp: Timestamp, findings: impl IntoIterator<Item = Finding>) -> Self {
        let mut verdict = Self {
            timestamp,
            is_anomaly: false,
            contributions: BTreeMap::new(),
            violations: Vec::new(),
        };

        for finding in findings {
            verdict.is_anomaly |= finding.contribution.flagged;
            verdict.contributions.insert(finding.kind, finding.contribution);
            verdict.violations.extend(finding.violations);
        }

        verdict
    }

    /// Channels that crossed a static bound
    pub fn violating_channels(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.channel.as_str())
    }

    /// Contribution of `kind`, if that detector ran
    pub fn contribution(&self, kind: DetectorKind) -> Option<&Contribution> {
        self.contributions.get(&kind)
    }

    /// True if `kind` ran and flagged the sample
    pub fn flagged_by(&self, kind: DetectorKind) -> bool {
        self.contribution(kind).is_some_and(|c| c.flagged)
    }

    /// Statistical anomaly score, when the statistical detector ran
    pub fn severity(&self) -> Option<f64> {
        self.contribution(DetectorKind::Statistical)
            .and_then(|c| c.score)
    }
}
