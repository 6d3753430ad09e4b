//! Answer Confidence Estimation
//!
//! c(t, s) = w_t · e^(-t / T) + w_s · e^(-s / S)
//!
//! - t: response time (ms), T: `maxTimeMs`
//! - s: answer switch count, S: `maxSwitches`
//! - w_t + w_s = 1
//!
//! Exponential rather than linear decay: an instant, unswitched answer scores
//! exactly 1 and no finite observation ever scores 0.
//!
//! The weighted sum is evaluated directly so that small confidences deep in
//! the tail keep their full relative precision. Only the instant, unswitched
//! answer is pinned to 1.0, whatever the rounding of the weights.

use crate::config::ConfidenceConfig;
use crate::types::{Confidence, ResponseTime, SwitchCount};

/// Confidence coefficient in (0, 1] for one observed answer.
pub fn confidence(
    response_time: ResponseTime,
    switch_count: SwitchCount,
    config: &ConfidenceConfig,
) -> Confidence {
    let time_factor = decay_factor(response_time.as_millis(), config.max_time_ms);
    let switch_factor = decay_factor(f64::from(switch_count.get()), config.max_switches);

    if time_factor == 1.0 && switch_factor == 1.0 {
        return Confidence::FULL;
    }

    let value = config.time_weight * time_factor + config.switch_weight * switch_factor;
    Confidence::from_f64(value).unwrap_or(Confidence::FULL)
}

/// e^(-x / scale)
fn decay_factor(x: f64, scale: f64) -> f64 {
    (-x / scale).exp()
}
