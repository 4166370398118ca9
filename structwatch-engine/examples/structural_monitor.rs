//! Simulated strain gauge and accelerometer monitoring
//!
//! Fits the engine on a healthy baseline, then streams readings from a seeded
//! simulator through a `Monitor` and prints one status line per sample.
//!
//! ```text
//! cargo run -p structwatch-engine --example structural_monitor
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use structwatch_core::stream::{SampleSource, SourceError};
use structwatch_core::{ChannelBounds, ChannelSet, DetectorKind, Sample, Verdict};
use structwatch_engine::{DetectionEngine, EngineConfig, Monitor, VerdictSink};

/// Readings every half second
const PERIOD_MS: u64 = 500;

/// Seeded strain gauge + accelerometer rig
struct SimulatedRig {
    rng: ChaCha8Rng,
    strain: (f64, f64),
    acceleration: (f64, f64),
    emitted: u64,
    limit: u64,
}

impl SimulatedRig {
    fn new(seed: u64, strain: (f64, f64), acceleration: (f64, f64), limit: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            strain,
            acceleration,
            emitted: 0,
            limit,
        }
    }
}

impl SampleSource for SimulatedRig {
    fn poll_next(&mut self) -> nb::Result<Sample, SourceError> {
        if self.emitted >= self.limit {
            return Err(nb::Error::Other(SourceError::EndOfStream));
        }
        let sample = Sample::new(self.emitted * PERIOD_MS)
            .with("strain", self.rng.gen_range(self.strain.0..self.strain.1))
            .with("acceleration", self.rng.gen_range(self.acceleration.0..self.acceleration.1));
        self.emitted += 1;
        Ok(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.limit - self.emitted) as usize;
        (remaining, Some(remaining))
    }
}

/// Prints one line per verdict
struct Console;

impl VerdictSink for Console {
    fn accept(&mut self, sample: &Sample, verdict: &Verdict) {
        let status = match (
            verdict.flagged_by(DetectorKind::Threshold),
            verdict.flagged_by(DetectorKind::Statistical),
        ) {
            (true, _) => "Anomaly Detected! (limit)",
            (false, true) => "Anomaly Detected! (unusual)",
            (false, false) => "Normal",
        };
        println!(
            "Time: {:>5.2}s | Strain: {:.2} | Acceleration: {:>5.2} | Status: {}",
            sample.timestamp as f64 / 1000.0,
            sample.get("strain").unwrap_or(f64::NAN),
            sample.get("acceleration").unwrap_or(f64::NAN),
            status
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::new(ChannelSet::new(["strain", "acceleration"])?)
        .with_bounds("strain", ChannelBounds::range(0.9, 1.1))
        .with_bounds("acceleration", ChannelBounds::symmetric(0.4))
        .with_contamination(0.05)
        .with_seed(Some(42));
    let engine = DetectionEngine::new(config)?;

    // Healthy baseline, collected before the rig was loaded
    let mut baseline_rig = SimulatedRig::new(7, (0.95, 1.05), (-0.3, 0.3), 1000);
    let mut baseline = Vec::new();
    while let Ok(sample) = baseline_rig.poll_next() {
        baseline.push(sample);
    }
    engine.fit(&baseline)?;
    println!(
        "Fitted on {} samples, decision threshold {:.4}",
        baseline.len(),
        engine.decision_threshold().unwrap_or(f64::NAN)
    );

    let mut monitor = Monitor::new(&engine, SimulatedRig::new(42, (0.8, 1.2), (-0.5, 0.5), 20));
    let stats = monitor.drain(&mut Console)?;

    println!(
        "{} samples, {} anomalies, {} skipped",
        stats.classified, stats.anomalies, stats.skipped
    );
    Ok(())
}
