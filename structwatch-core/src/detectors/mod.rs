//! Rule-Based Detectors
//!
//! ## Overview
//!
//! Rule-based detection compares each raw reading against static limits
//! chosen by an engineer: a strain gauge above its design strain, a
//! temperature above the range the structure was rated for, vibration
//! amplitude above a comfort or damage threshold.
//!
//! These rules need no training data and work from the first sample, which is
//! why a threshold-only engine never has to be fitted. They complement the
//! statistical detector in `structwatch-ml`:
//!
//! 1. **Rules first**: hard engineering limits catch known failure modes
//! 2. **Statistics second**: unusual combinations that stay within limits
//! 3. **Aggregation**: the engine flags a sample if either one does
//!
//! ## Bound Semantics
//!
//! Bounds are inclusive. A reading exactly on a limit is normal. Either side
//! of a bound may be left open.
//!
//! ```text
//!         lower                upper
//!  ---------|====================|---------
//!  anomaly        normal              anomaly
//! ```

mod threshold;
mod utils;

pub use threshold::{ChannelBounds, ThresholdDetector};
pub use utils::check_bounds;
