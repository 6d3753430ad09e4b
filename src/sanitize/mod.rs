//! Input Sanitization
//!
//! The boundary between loosely typed caller input and the typed compute
//! functions. Everything here is total: any combination of missing,
//! non-numeric, non-finite or out-of-range values is coerced to the nearest
//! valid domain value.
//!
//! Coercion rules:
//! - current mastery: non-finite or missing -> `masteryInit`, else clamp to [0, 1]
//! - difficulty: tier names map through the config, numbers clamp to [0, 1],
//!   anything else -> the `medium` tier
//! - result: `true`, numbers >= 0.5 and the strings "true"/"correct" count as
//!   correct, everything else as incorrect
//! - response time: missing, non-finite or negative -> 0
//! - switch count: rounded, floored at 0, saturating at `u32::MAX`

use serde::{Deserialize, Serialize};

use crate::config::MasteryConfig;
use crate::types::{
    AttemptEvent, Difficulty, DifficultyTier, Mastery, Outcome, ResponseTime, SwitchCount,
};

/// A loosely typed scalar as received from JSON or another dynamic source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Missing,
    Flag(bool),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl RawValue {
    /// Numeric reading of the value, `None` when there is no finite one.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(x) => *x,
            RawValue::Flag(b) => f64::from(u8::from(*b)),
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Missing | RawValue::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(x: f64) -> Self {
        RawValue::Number(x)
    }
}

impl From<f32> for RawValue {
    fn from(x: f32) -> Self {
        RawValue::Number(f64::from(x))
    }
}

impl From<i64> for RawValue {
    fn from(x: i64) -> Self {
        RawValue::Number(x as f64)
    }
}

impl From<i32> for RawValue {
    fn from(x: i32) -> Self {
        RawValue::Number(f64::from(x))
    }
}

impl From<u32> for RawValue {
    fn from(x: u32) -> Self {
        RawValue::Number(f64::from(x))
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Flag(b)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Missing, Into::into)
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Missing,
            serde_json::Value::Bool(b) => RawValue::Flag(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(RawValue::Missing, RawValue::Number),
            serde_json::Value::String(s) => RawValue::Text(s),
            other => RawValue::Other(other),
        }
    }
}

/// One mastery calculation request in raw form. Every field is optional on
/// the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttemptCalculation {
    pub current_mastery: RawValue,
    pub difficulty: RawValue,
    pub result: RawValue,
    #[serde(alias = "responseTimeMs")]
    pub response_time: RawValue,
    pub switch_count: RawValue,
}

impl AttemptCalculation {
    pub fn new(
        current_mastery: impl Into<RawValue>,
        difficulty: impl Into<RawValue>,
        result: impl Into<RawValue>,
        response_time: impl Into<RawValue>,
        switch_count: impl Into<RawValue>,
    ) -> Self {
        Self {
            current_mastery: current_mastery.into(),
            difficulty: difficulty.into(),
            result: result.into(),
            response_time: response_time.into(),
            switch_count: switch_count.into(),
        }
    }
}

/// An attempt whose every field is inside its domain. Deserializing one
/// fails on any out-of-domain field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedAttempt {
    pub current_mastery: Mastery,
    pub difficulty: Difficulty,
    pub outcome: Outcome,
    pub response_time: ResponseTime,
    pub switch_count: SwitchCount,
}

// ==================== Field coercion ====================

/// Mastery in [0, 1]; missing or non-finite input becomes `masteryInit`.
pub fn sanitize_mastery(raw: &RawValue, config: &MasteryConfig) -> Mastery {
    raw.as_f64()
        .and_then(Mastery::from_f64)
        .unwrap_or_else(|| seed_mastery(config))
}

/// Difficulty from a number or a tier name, defaulting to the `medium` tier.
pub fn sanitize_difficulty(raw: &RawValue, config: &MasteryConfig) -> Difficulty {
    let value = raw
        .as_f64()
        .or_else(|| {
            raw.as_text()
                .and_then(DifficultyTier::from_str)
                .map(|tier| config.difficulty.get(tier))
        })
        .unwrap_or(config.difficulty.medium);
    Difficulty::from_f64(value).unwrap_or_else(|| medium_difficulty(config))
}

/// Correct or incorrect. Anything unrecognized counts as incorrect.
pub fn sanitize_outcome(raw: &RawValue) -> Outcome {
    if let Some(text) = raw.as_text() {
        match text.trim().to_lowercase().as_str() {
            "true" | "correct" => return Outcome::Correct,
            "false" | "incorrect" | "wrong" => return Outcome::Incorrect,
            _ => {}
        }
    }
    match raw.as_f64() {
        Some(x) if x >= 0.5 => Outcome::Correct,
        _ => Outcome::Incorrect,
    }
}

/// Non-negative latency in ms, 0 when unusable.
pub fn sanitize_response_time(raw: &RawValue) -> ResponseTime {
    raw.as_f64()
        .and_then(ResponseTime::from_millis)
        .unwrap_or(ResponseTime::ZERO)
}

/// Rounded, non-negative switch count.
pub fn sanitize_switch_count(raw: &RawValue) -> SwitchCount {
    // `as` saturates for out-of-range floats
    let count = raw.as_f64().map_or(0, |x| x.round().max(0.0) as u32);
    SwitchCount(count)
}

// ==================== Attempt sanitization ====================

/// Coerces a raw calculation request into a [`ValidatedAttempt`].
pub fn sanitize_calculation(raw: &AttemptCalculation, config: &MasteryConfig) -> ValidatedAttempt {
    ValidatedAttempt {
        current_mastery: sanitize_mastery(&raw.current_mastery, config),
        difficulty: sanitize_difficulty(&raw.difficulty, config),
        outcome: sanitize_outcome(&raw.result),
        response_time: sanitize_response_time(&raw.response_time),
        switch_count: sanitize_switch_count(&raw.switch_count),
    }
}

/// Coerces a storage event plus the stored mastery (if any) into a
/// [`ValidatedAttempt`]. A missing or non-finite stored mastery is replaced
/// by `masteryInit`.
pub fn sanitize_event(
    event: &AttemptEvent,
    current_mastery: Option<f64>,
    config: &MasteryConfig,
) -> ValidatedAttempt {
    ValidatedAttempt {
        current_mastery: sanitize_mastery(&current_mastery.into(), config),
        difficulty: Difficulty::from_f64(event.difficulty)
            .unwrap_or_else(|| medium_difficulty(config)),
        outcome: Outcome::from(event.is_correct),
        response_time: ResponseTime::from_millis(event.response_time_ms)
            .unwrap_or(ResponseTime::ZERO),
        switch_count: SwitchCount(event.switch_count),
    }
}

fn seed_mastery(config: &MasteryConfig) -> Mastery {
    Mastery::from_f64(config.mastery_init).unwrap_or(Mastery::ZERO)
}

fn medium_difficulty(config: &MasteryConfig) -> Difficulty {
    Difficulty::from_f64(config.difficulty.medium).unwrap_or(Difficulty::MEDIUM)
}
