//! Shared fixtures for engine integration tests
//!
//! All synthetic data comes from seeded ChaCha8 generators so every test run
//! sees identical samples.

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use structwatch_core::{ChannelBounds, ChannelSet, Sample};
use structwatch_engine::EngineConfig;

// ===== FIXTURE CONSTANTS =====

/// Nominal strain of the reference batch (microstrain).
pub const STRAIN_MEAN: f64 = 100.0;
pub const STRAIN_STD: f64 = 5.0;

/// Upper strain limit used across tests.
pub const STRAIN_LIMIT: f64 = 120.0;

/// Ambient temperature (°C) and its limit.
pub const TEMP_MEAN: f64 = 25.0;
pub const TEMP_STD: f64 = 1.5;
pub const TEMP_LIMIT: f64 = 40.0;

/// Vibration amplitude (g) and its limit.
pub const VIBRATION_MEAN: f64 = 0.02;
pub const VIBRATION_STD: f64 = 0.005;
pub const VIBRATION_LIMIT: f64 = 0.05;

/// Hourly readings, in milliseconds.
pub const SAMPLE_PERIOD_MS: u64 = 3_600_000;

// ===== GENERATORS =====

/// Seeded generator of normally distributed values
pub struct Normal {
    rng: ChaCha8Rng,
    spare: Option<f64>,
}

impl Normal {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            spare: None,
        }
    }

    /// Standard normal draw (Box-Muller)
    pub fn standard(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        let u1: f64 = 1.0 - self.rng.gen::<f64>();
        let u2: f64 = self.rng.gen();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = 2.0 * std::f64::consts::PI * u2;
        self.spare = Some(radius * angle.sin());
        radius * angle.cos()
    }

    pub fn sample(&mut self, mean: f64, std: f64) -> f64 {
        mean + std * self.standard()
    }

    /// Uniform draw in `[low, high)`
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.gen_range(low..high)
    }
}

/// Strain-only reference batch, strain ~ N(100, 5)
pub fn strain_reference(n: usize, seed: u64) -> Vec<Sample> {
    let mut normal = Normal::seeded(seed);
    (0..n)
        .map(|i| Sample::new(i as u64 * SAMPLE_PERIOD_MS).with("strain", normal.sample(STRAIN_MEAN, STRAIN_STD)))
        .collect()
}

/// Strain, temperature and vibration readings of a healthy bridge deck
pub fn bridge_reference(n: usize, seed: u64) -> Vec<Sample> {
    let mut normal = Normal::seeded(seed);
    (0..n)
        .map(|i| {
            Sample::new(i as u64 * SAMPLE_PERIOD_MS)
                .with("strain", normal.sample(STRAIN_MEAN, STRAIN_STD))
                .with("temperature", normal.sample(TEMP_MEAN, TEMP_STD))
                .with("vibration", normal.sample(VIBRATION_MEAN, VIBRATION_STD))
        })
        .collect()
}

pub fn bridge_channels() -> ChannelSet {
    ChannelSet::new(["strain", "temperature", "vibration"]).unwrap()
}

/// Bridge channels with the usual static limits and both detectors
pub fn bridge_config() -> EngineConfig {
    EngineConfig::new(bridge_channels())
        .with_bounds("strain", ChannelBounds::upper(STRAIN_LIMIT))
        .with_bounds("temperature", ChannelBounds::upper(TEMP_LIMIT))
        .with_bounds("vibration", ChannelBounds::upper(VIBRATION_LIMIT))
}

pub fn bridge_sample(timestamp: u64, strain: f64, temperature: f64, vibration: f64) -> Sample {
    Sample::new(timestamp)
        .with("strain", strain)
        .with("temperature", temperature)
        .with("vibration", vibration)
}
