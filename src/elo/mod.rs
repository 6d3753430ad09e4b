//! ELO-style Mastery Update
//!
//! Mastery and item difficulty live on the same [0, 1] scale, so the classic
//! player-vs-player ELO rule carries over with a 0.4 spread instead of 400
//! points:
//!
//! - Expected score: E = 1 / (1 + 10^((d - m) / 0.4))
//! - K-factor:       K = kBase · (1 + d) · (1 - c/2)
//! - Update:         m' = clamp(m + K · (r - E), 0, 1)
//!
//! Harder items move the estimate more. Confident answers (fast, no answer
//! switching) move it less, since one decisive observation should not
//! over-correct.

use crate::confidence::confidence;
use crate::config::MasteryConfig;
use crate::sanitize::ValidatedAttempt;
use crate::types::{
    Confidence, Difficulty, UpdateResult, ELO_SCALE, EXPECTED_SCORE_MARGIN, MAX_K_FACTOR,
    MIN_K_FACTOR,
};

/// Damping applied to the K-factor at full confidence.
const CONFIDENCE_DAMPING: f64 = 0.5;

// ==================== Expected score ====================

/// Predicted probability of a correct answer.
///
/// Accepts arbitrary floats and always returns a value strictly inside
/// (0, 1). Equal inputs give exactly 0.5; NaN gives the neutral 0.5.
pub fn expected_score(mastery: f64, difficulty: f64) -> f64 {
    let exponent = (difficulty - mastery) / ELO_SCALE;
    if exponent.is_nan() {
        return 0.5;
    }
    let score = 1.0 / (1.0 + 10f64.powf(exponent));
    score.clamp(EXPECTED_SCORE_MARGIN, 1.0 - EXPECTED_SCORE_MARGIN)
}

// ==================== Adaptive K-factor ====================

/// Per-attempt learning rate, in (0, 1).
///
/// Increasing in difficulty, decreasing in confidence.
pub fn k_factor(difficulty: Difficulty, confidence: Confidence, k_base: f64) -> f64 {
    let k = k_base * (1.0 + difficulty.value()) * (1.0 - CONFIDENCE_DAMPING * confidence.value());
    if k.is_finite() {
        k.clamp(MIN_K_FACTOR, MAX_K_FACTOR)
    } else {
        MIN_K_FACTOR
    }
}

// ==================== Mastery update ====================

/// Applies one attempt to the current mastery and returns the new value
/// along with the K-factor and confidence that produced it.
pub fn update_mastery(attempt: &ValidatedAttempt, config: &MasteryConfig) -> UpdateResult {
    let conf = confidence(attempt.response_time, attempt.switch_count, &config.confidence);
    let k = k_factor(attempt.difficulty, conf, config.k_base);

    let mastery = attempt.current_mastery.value();
    let expected = expected_score(mastery, attempt.difficulty.value());
    let new_mastery = (mastery + k * (attempt.outcome.score() - expected)).clamp(0.0, 1.0);

    UpdateResult {
        new_mastery,
        k_factor: k,
        confidence: conf.value(),
    }
}
