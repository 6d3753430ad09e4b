//! Shared types and constants.
//!
//! Two families live here:
//! - wire-facing records exchanged with the storage layer
//!   ([`AttemptEvent`], [`MasteryState`], [`ScheduleDecision`], [`UpdateResult`])
//! - validated domain newtypes that the compute functions accept
//!   ([`Mastery`], [`Difficulty`], [`Confidence`], [`Outcome`],
//!   [`ResponseTime`], [`SwitchCount`])
//!
//! The newtypes can only hold in-domain values, so every formula downstream
//! of [`crate::sanitize`] is total by construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Logistic scale of the expected-score curve (the mastery-space analogue
/// of the 400 point ELO spread).
pub const ELO_SCALE: f64 = 0.4;

/// Smallest confidence the estimator will report.
pub const MIN_CONFIDENCE: f64 = f64::MIN_POSITIVE;

/// Expected scores are kept this far away from 0 and 1.
pub const EXPECTED_SCORE_MARGIN: f64 = f64::EPSILON;

/// K-factor bounds. The open interval (0, 1) is enforced by clamping into
/// this closed one.
pub const MIN_K_FACTOR: f64 = 1e-9;
pub const MAX_K_FACTOR: f64 = 1.0 - 1e-9;

/// Upper bound for `kBase`. With `(1 + d) <= 2` and `(1 - c/2) < 1` this keeps
/// the raw K-factor strictly below 1 without clamping.
pub const MAX_K_BASE: f64 = 0.5;

pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Upper bound for the base review interval (10 years).
pub const MAX_BASE_INTERVAL_MS: f64 = 10.0 * 365.0 * MS_PER_DAY;

/// Upper bound for the review mastery scale factor.
pub const MAX_MASTERY_SCALE_FACTOR: f64 = 100.0;

// ==================== Validated domain values ====================

/// A stored or transmitted value that lies outside its type's domain.
/// Deserialization rejects such values instead of clamping them, so corrupt
/// records surface to the caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} {value} is outside its domain")]
pub struct DomainError {
    pub kind: &'static str,
    pub value: f64,
}

fn check_domain(kind: &'static str, value: f64, in_domain: bool) -> Result<f64, DomainError> {
    if value.is_finite() && in_domain {
        Ok(value)
    } else {
        Err(DomainError { kind, value })
    }
}

/// Mastery estimate in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct Mastery(f64);

impl Mastery {
    pub const ZERO: Mastery = Mastery(0.0);

    /// Returns `None` for non-finite input, otherwise clamps into `[0, 1]`.
    pub fn from_f64(value: f64) -> Option<Self> {
        value.is_finite().then(|| Self(value.clamp(0.0, 1.0)))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Mastery {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        check_domain("mastery", value, (0.0..=1.0).contains(&value)).map(Self)
    }
}

/// Item difficulty in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct Difficulty(f64);

impl Difficulty {
    pub const MEDIUM: Difficulty = Difficulty(0.5);

    pub fn from_f64(value: f64) -> Option<Self> {
        value.is_finite().then(|| Self(value.clamp(0.0, 1.0)))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Difficulty {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        check_domain("difficulty", value, (0.0..=1.0).contains(&value)).map(Self)
    }
}

/// Confidence coefficient in `(0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub const FULL: Confidence = Confidence(1.0);

    pub fn from_f64(value: f64) -> Option<Self> {
        value
            .is_finite()
            .then(|| Self(value.clamp(MIN_CONFIDENCE, 1.0)))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        check_domain("confidence", value, (MIN_CONFIDENCE..=1.0).contains(&value)).map(Self)
    }
}

/// Observed result of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn score(self) -> f64 {
        match self {
            Outcome::Correct => 1.0,
            Outcome::Incorrect => 0.0,
        }
    }
}

impl From<bool> for Outcome {
    fn from(is_correct: bool) -> Self {
        if is_correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }
}

/// Response latency in milliseconds, finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64")]
pub struct ResponseTime(f64);

impl ResponseTime {
    pub const ZERO: ResponseTime = ResponseTime(0.0);

    pub fn from_millis(ms: f64) -> Option<Self> {
        ms.is_finite().then(|| Self(ms.max(0.0)))
    }

    pub fn as_millis(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for ResponseTime {
    type Error = DomainError;

    fn try_from(ms: f64) -> Result<Self, Self::Error> {
        check_domain("response time", ms, ms >= 0.0).map(Self)
    }
}

/// Number of times the learner changed their answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SwitchCount(pub u32);

impl SwitchCount {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Named difficulty tiers used by content collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTier {
    Easy,
    Medium,
    Hard,
}

impl DifficultyTier {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(DifficultyTier::Easy),
            "medium" | "mid" => Some(DifficultyTier::Medium),
            "hard" => Some(DifficultyTier::Hard),
            _ => None,
        }
    }
}

// ==================== Storage-facing records ====================

/// One practice attempt as delivered by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptEvent {
    pub topic_id: String,
    pub difficulty: f64,
    pub is_correct: bool,
    #[serde(default)]
    pub response_time_ms: f64,
    #[serde(default)]
    pub switch_count: u32,
}

/// Persisted per-topic mastery. Owned by the caller; the engine only ever
/// returns fresh copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasteryState {
    pub topic_id: String,
    pub mastery: f64,
    pub last_reviewed_at: DateTime<Utc>,
    pub review_count: u32,
}

/// Review priority and due time for one topic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDecision {
    pub review_weight: f64,
    pub next_review_at: DateTime<Utc>,
}

/// Result of a single mastery update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub new_mastery: f64,
    pub k_factor: f64,
    pub confidence: f64,
}
