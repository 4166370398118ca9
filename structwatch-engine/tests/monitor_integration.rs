//! Streaming Monitor Integration Tests
//!
//! Replays recorded sample streams through a fitted engine and checks the
//! monitor keeps going past malformed samples.

mod common;

use structwatch_core::stream::{MemorySource, SampleSource, SourceError};
use structwatch_core::{Sample, Verdict};
use structwatch_engine::{DetectionEngine, EngineConfig, Monitor, MonitorError, VerdictSink};

use common::*;

/// Sink that only keeps anomalous timestamps
#[derive(Default)]
struct AlertLog {
    alerts: Vec<u64>,
    seen: usize,
}

impl VerdictSink for AlertLog {
    fn accept(&mut self, sample: &Sample, verdict: &Verdict) {
        self.seen += 1;
        if verdict.is_anomaly {
            self.alerts.push(sample.timestamp);
        }
    }
}

/// Source whose transport dies after a fixed number of samples
struct DroppingLink<'a> {
    inner: MemorySource<'a>,
    remaining: usize,
}

impl SampleSource for DroppingLink<'_> {
    fn poll_next(&mut self) -> nb::Result<Sample, SourceError> {
        if self.remaining == 0 {
            return Err(nb::Error::Other(SourceError::Transport("link lost")));
        }
        self.remaining -= 1;
        self.inner.poll_next()
    }
}

fn fitted_engine() -> DetectionEngine {
    let engine = DetectionEngine::new(bridge_config()).unwrap();
    engine.fit(&bridge_reference(300, 42)).unwrap();
    engine
}

#[test]
fn malformed_samples_are_skipped() {
    let engine = fitted_engine();

    let mut stream = bridge_reference(20, 8);
    stream[2] = Sample::new(2).with("strain", STRAIN_MEAN);
    stream[5].insert("vibration", f64::NAN);
    stream[9].insert("tilt", 0.3);
    stream[12].insert("strain", f64::INFINITY);
    stream[15] = bridge_sample(15, 135.0, TEMP_MEAN, VIBRATION_MEAN);

    let mut sink = AlertLog::default();
    let mut monitor = Monitor::new(&engine, MemorySource::new(&stream));
    let stats = monitor.drain(&mut sink).unwrap();

    assert_eq!(stats.samples_seen, 20);
    assert_eq!(stats.skipped, 4);
    assert_eq!(stats.classified, 16);
    assert_eq!(sink.seen, 16);
    assert!(sink.alerts.contains(&15));
    assert_eq!(stats.anomalies, sink.alerts.len());
}

#[test]
fn monitor_matches_batch_classification() {
    let engine = fitted_engine();
    let stream = bridge_reference(50, 11);

    let mut verdicts: Vec<Verdict> = Vec::new();
    Monitor::new(&engine, MemorySource::new(&stream))
        .drain(&mut verdicts)
        .unwrap();

    assert_eq!(verdicts, engine.classify_batch(&stream).unwrap());
}

#[test]
fn transport_failure_is_reported() {
    let engine = fitted_engine();
    let stream = bridge_reference(10, 4);

    let mut verdicts: Vec<Verdict> = Vec::new();
    let mut monitor = Monitor::new(
        &engine,
        DroppingLink {
            inner: MemorySource::new(&stream),
            remaining: 3,
        },
    );

    assert_eq!(
        monitor.drain(&mut verdicts).unwrap_err(),
        MonitorError::Source(SourceError::Transport("link lost"))
    );
    assert_eq!(verdicts.len(), 3);
    assert_eq!(monitor.stats().classified, 3);
}

#[test]
fn engine_from_json_drives_monitor() {
    let json = r#"{
        "channels": ["strain", "acceleration"],
        "bounds": {
            "strain": { "lower": 0.9, "upper": 1.1 },
            "acceleration": { "lower": -0.4, "upper": 0.4 }
        },
        "detectors_enabled": ["threshold"]
    }"#;
    let engine = DetectionEngine::new(EngineConfig::from_json(json).unwrap()).unwrap();

    let mut rng = Normal::seeded(5);
    let stream: Vec<Sample> = (0..40)
        .map(|i| {
            Sample::new(i * 500)
                .with("strain", rng.uniform(0.8, 1.2))
                .with("acceleration", rng.uniform(-0.5, 0.5))
        })
        .collect();

    let mut verdicts: Vec<Verdict> = Vec::new();
    let stats = Monitor::new(&engine, MemorySource::new(&stream))
        .drain(&mut verdicts)
        .unwrap();

    let expected = stream
        .iter()
        .filter(|s| {
            let strain = s.get("strain").unwrap();
            let acceleration = s.get("acceleration").unwrap();
            !(0.9..=1.1).contains(&strain) || acceleration.abs() > 0.4
        })
        .count();
    assert_eq!(stats.anomalies, expected);
    assert_eq!(verdicts.len(), 40);
}
