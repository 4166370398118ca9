//! Common bound-checking helpers
//!
//! Pure functions shared by rule-based detection. They take plain values and
//! return plain values, so they can be tested in isolation and called from any
//! context.

use crate::verdict::BoundViolation;

/// Check `value` against optional lower and upper limits
///
/// Returns the crossed bound, or `None` if the value is within range. Limits
/// are inclusive: a reading exactly on a bound is not a violation.
pub fn check_bounds(value: f64, lower: Option<f64>, upper: Option<f64>) -> Option<BoundViolation> {
    match (lower, upper) {
        (Some(min), _) if value < min => Some(BoundViolation::Below(min)),
        (_, Some(max)) if value > max => Some(BoundViolation::Above(max)),
        _ => None,
    }
}
