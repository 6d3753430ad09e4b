//! Time decay of retained mastery.
//!
//! w = e^(-λ · days), bounded to (0, 1].

use chrono::{DateTime, Utc};

use crate::types::MS_PER_DAY;

/// Whole and fractional days from `last_reviewed_at` to `now`. A review
/// stamped in the future counts as zero elapsed days.
pub fn days_since(last_reviewed_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed_ms = now.signed_duration_since(last_reviewed_at).num_milliseconds();
    (elapsed_ms as f64 / MS_PER_DAY).max(0.0)
}

/// Decay weight for a number of elapsed days.
pub fn decay_weight(elapsed_days: f64, decay_rate: f64) -> f64 {
    let days = if elapsed_days.is_nan() { 0.0 } else { elapsed_days.max(0.0) };
    let weight = (-decay_rate * days).exp();
    if weight.is_nan() {
        return 1.0;
    }
    weight.clamp(f64::MIN_POSITIVE, 1.0)
}
