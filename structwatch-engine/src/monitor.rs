//! Streaming monitor
//!
//! Connects a [`SampleSource`] to a [`DetectionEngine`] and hands every
//! verdict to a [`VerdictSink`]. Samples the engine rejects as malformed are
//! logged and counted, then skipped; the stream keeps going.

use thiserror::Error;

use structwatch_core::stream::{SampleSource, SourceError};
use structwatch_core::{DetectionError, Sample, Verdict};

use crate::DetectionEngine;

/// Receiver for classification results
pub trait VerdictSink {
    /// Called once per classified sample, in stream order
    fn accept(&mut self, sample: &Sample, verdict: &Verdict);
}

impl VerdictSink for Vec<Verdict> {
    fn accept(&mut self, _sample: &Sample, verdict: &Verdict) {
        self.push(verdict.clone());
    }
}

/// Errors that stop a monitor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    /// The source failed or ended
    #[error("Sample source: {0}")]
    Source(#[from] SourceError),

    /// The engine cannot classify any sample, e.g. it is not fitted
    #[error("Detection: {0}")]
    Detection(#[from] DetectionError),
}

/// Counters for a monitor run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStats {
    /// Samples pulled from the source
    pub samples_seen: usize,
    /// Samples classified and handed to the sink
    pub classified: usize,
    /// Classified samples with `is_anomaly`
    pub anomalies: usize,
    /// Malformed samples skipped
    pub skipped: usize,
}

/// Result of one monitor step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Sample classified and delivered to the sink
    Classified {
        /// Whether the verdict flagged an anomaly
        is_anomaly: bool,
    },
    /// Sample was malformed and dropped
    Skipped,
}

/// Drives samples from a source through an engine
///
/// ```rust
/// use structwatch_core::stream::MemorySource;
/// use structwatch_core::{ChannelBounds, ChannelSet, DetectorKind, Sample, Verdict};
/// use structwatch_engine::{DetectionEngine, EngineConfig, Monitor};
///
/// let config = EngineConfig::new(ChannelSet::new(["strain"]).unwrap())
///     .with_bounds("strain", ChannelBounds::range(0.9, 1.1))
///     .with_detectors([DetectorKind::Threshold]);
/// let engine = DetectionEngine::new(config).unwrap();
///
/// let samples = vec![
///     Sample::new(0).with("strain", 1.0),
///     Sample::new(500).with("strain", 1.2),
/// ];
///
/// let mut verdicts: Vec<Verdict> = Vec::new();
/// let mut monitor = Monitor::new(&engine, MemorySource::new(&samples));
/// let stats = monitor.drain(&mut verdicts).unwrap();
///
/// assert_eq!(stats.anomalies, 1);
/// assert!(verdicts[1].is_anomaly);
/// ```
pub struct Monitor<'e, S: SampleSource> {
    engine: &'e DetectionEngine,
    source: S,
    stats: MonitorStats,
}

impl<'e, S: SampleSource> Monitor<'e, S> {
    /// Create a monitor reading from `source`
    pub fn new(engine: &'e DetectionEngine, source: S) -> Self {
        Self {
            engine,
            source,
            stats: MonitorStats::default(),
        }
    }

    /// Pull and classify the next sample
    ///
    /// `WouldBlock` means the source has nothing ready. End of stream is
    /// reported as `MonitorError::Source(SourceError::EndOfStream)`.
    pub fn step<K: VerdictSink + ?Sized>(&mut self, sink: &mut K) -> nb::Result<StepOutcome, MonitorError> {
        let sample = self
            .source
            .poll_next()
            .map_err(|e| e.map(MonitorError::Source))?;
        self.stats.samples_seen += 1;

        match self.engine.classify(&sample) {
            Ok(verdict) => {
                self.stats.classified += 1;
                if verdict.is_anomaly {
                    self.stats.anomalies += 1;
                }
                sink.accept(&sample, &verdict);
                Ok(StepOutcome::Classified {
                    is_anomaly: verdict.is_anomaly,
                })
            }
            Err(e) if e.is_sample_error() => {
                self.stats.skipped += 1;
                log::warn!("skipping sample {}: {}", sample.timestamp, e);
                Ok(StepOutcome::Skipped)
            }
            Err(e) => Err(nb::Error::Other(MonitorError::Detection(e))),
        }
    }

    /// Step until the source ends or has nothing ready
    ///
    /// Returns the cumulative statistics.
    pub fn drain<K: VerdictSink + ?Sized>(&mut self, sink: &mut K) -> Result<MonitorStats, MonitorError> {
        loop {
            match self.step(sink) {
                Ok(_) => {}
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(MonitorError::Source(SourceError::EndOfStream))) => break,
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
        Ok(self.stats)
    }

    /// Statistics so far
    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    /// Reset statistics
    pub fn reset_stats(&mut self) {
        self.stats = MonitorStats::default();
    }

    /// Give back the source
    pub fn into_source(self) -> S {
        self.source
    }
}
