//! Review Scheduling
//!
//! Turns a mastery estimate and the time since its last review into:
//! - a review weight in [0, 2] that collaborators sort on (higher = more urgent)
//! - the next review timestamp, pushed further out as mastery grows
//!
//! Formulas:
//! - weight:   W = (1 - m) + (1 - w_decay)
//! - interval: I = baseInterval · (1 + scale · m)
//!
//! Both weight terms lie in [0, 1], so W stays in [0, 2] without clamping and
//! is strictly monotonic in mastery and in elapsed time.

pub mod decay;

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::ReviewConfig;
use crate::types::{Mastery, ScheduleDecision};

pub use decay::{days_since, decay_weight};

const MAX_REVIEW_WEIGHT: f64 = 2.0;

/// Review priority for a topic with the given mastery and decay weight.
pub fn review_weight(mastery: Mastery, decay: f64) -> f64 {
    let forgotten = if decay.is_nan() { 0.0 } else { 1.0 - decay.clamp(0.0, 1.0) };
    ((1.0 - mastery.value()) + forgotten).clamp(0.0, MAX_REVIEW_WEIGHT)
}

/// Length of the next review interval in microseconds, at least 1.
pub fn review_interval_micros(mastery: Mastery, config: &ReviewConfig) -> i64 {
    let interval_ms = config.base_interval_ms * (1.0 + config.mastery_scale_factor * mastery.value());
    let micros = (interval_ms * 1000.0).round();
    if micros.is_nan() {
        return 1;
    }
    // `as` saturates at i64::MAX
    (micros.max(1.0)) as i64
}

/// When the topic should next be reviewed. Always later than `now`; an
/// interval that would run past the representable range saturates at the
/// latest representable instant.
pub fn next_review_at(mastery: Mastery, now: DateTime<Utc>, config: &ReviewConfig) -> DateTime<Utc> {
    let interval = TimeDelta::microseconds(review_interval_micros(mastery, config));
    now.checked_add_signed(interval)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Combined review decision for one topic.
pub fn schedule(
    mastery: Mastery,
    last_reviewed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    config: &ReviewConfig,
) -> ScheduleDecision {
    let decay = decay_weight(days_since(last_reviewed_at, now), config.decay_rate);
    ScheduleDecision {
        review_weight: review_weight(mastery, decay),
        next_review_at: next_review_at(mastery, now, config),
    }
}
