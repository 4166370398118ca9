//! Structural health anomaly detection engine
//!
//! Ties the pieces of `structwatch-core` and `structwatch-ml` together:
//!
//! ```text
//! Sample ──► ChannelSet::project ──► raw values ──────────► ThresholdDetector ─┐
//!                                        │                                    ├─► OR ─► Verdict
//!                                        └─► NormalizationStats ─► ModelState ─┘
//! ```
//!
//! The engine is fitted once on a reference batch that represents normal
//! behaviour of the structure, then classifies samples one at a time, in
//! batches, or from a [`SampleSource`](structwatch_core::stream::SampleSource)
//! through a [`Monitor`].
//!
//! ```rust
//! use structwatch_core::{ChannelBounds, ChannelSet, Sample};
//! use structwatch_engine::{DetectionEngine, EngineConfig};
//!
//! let config = EngineConfig::new(ChannelSet::new(["strain", "vibration"])?)
//!     .with_bounds("strain", ChannelBounds::upper(120.0))
//!     .with_bounds("vibration", ChannelBounds::upper(0.05));
//! let engine = DetectionEngine::new(config)?;
//!
//! let reference: Vec<Sample> = (0..200)
//!     .map(|i| {
//!         Sample::new(i)
//!             .with("strain", 100.0 + (i % 20) as f64 * 0.5)
//!             .with("vibration", 0.02 + (i % 7) as f64 * 0.001)
//!     })
//!     .collect();
//! engine.fit(&reference)?;
//!
//! let verdict = engine.classify(&Sample::new(200).with("strain", 131.0).with("vibration", 0.02))?;
//! assert!(verdict.is_anomaly);
//! # Ok::<(), structwatch_core::DetectionError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod monitor;

pub use config::{ConfigError, EngineConfig};
pub use engine::{DetectionEngine, EnginePhase};
pub use monitor::{Monitor, MonitorError, MonitorStats, StepOutcome, VerdictSink};
