//! Engine configuration.
//!
//! Every option has a default, so a partial JSON document or an empty
//! environment always yields a usable config. [`MasteryConfig::sanitized`]
//! coerces anything out of domain back into it; the engine only ever runs on
//! a sanitized config.

use serde::{Deserialize, Serialize};

use crate::types::{DifficultyTier, MAX_BASE_INTERVAL_MS, MAX_K_BASE, MAX_MASTERY_SCALE_FACTOR};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse mastery config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTiers {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl Default for DifficultyTiers {
    fn default() -> Self {
        Self {
            easy: 0.3,
            medium: 0.5,
            hard: 0.7,
        }
    }
}

impl DifficultyTiers {
    pub fn get(&self, tier: DifficultyTier) -> f64 {
        match tier {
            DifficultyTier::Easy => self.easy,
            DifficultyTier::Medium => self.medium,
            DifficultyTier::Hard => self.hard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfidenceConfig {
    pub time_weight: f64,
    pub switch_weight: f64,
    pub max_time_ms: f64,
    pub max_switches: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            time_weight: 0.3,
            switch_weight: 0.7,
            max_time_ms: 30_000.0,
            max_switches: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewConfig {
    pub base_interval_ms: f64,
    /// Consumed by collaborators through [`crate::MasteryEngine::is_mastered`].
    pub mastery_threshold: f64,
    /// Per-day decay constant of the time decay weight.
    pub decay_rate: f64,
    /// How much further out a fully mastered topic is scheduled, in units of
    /// `base_interval_ms`.
    pub mastery_scale_factor: f64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 24.0 * 60.0 * 60.0 * 1000.0,
            mastery_threshold: 0.7,
            decay_rate: 0.1,
            mastery_scale_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MasteryConfig {
    pub mastery_init: f64,
    pub k_base: f64,
    pub difficulty: DifficultyTiers,
    pub confidence: ConfidenceConfig,
    pub review: ReviewConfig,
}

impl Default for MasteryConfig {
    fn default() -> Self {
        Self {
            mastery_init: 0.3,
            k_base: 0.08,
            difficulty: DifficultyTiers::default(),
            confidence: ConfidenceConfig::default(),
            review: ReviewConfig::default(),
        }
    }
}

impl MasteryConfig {
    /// Parses a camelCase JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overridden by `MASTERY_*` environment variables. Values that
    /// fail to parse leave the default in place.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        override_from_env("MASTERY_INIT", &mut config.mastery_init);
        override_from_env("MASTERY_K_BASE", &mut config.k_base);
        override_from_env("MASTERY_DIFFICULTY_EASY", &mut config.difficulty.easy);
        override_from_env("MASTERY_DIFFICULTY_MEDIUM", &mut config.difficulty.medium);
        override_from_env("MASTERY_DIFFICULTY_HARD", &mut config.difficulty.hard);
        override_from_env(
            "MASTERY_CONFIDENCE_TIME_WEIGHT",
            &mut config.confidence.time_weight,
        );
        override_from_env(
            "MASTERY_CONFIDENCE_SWITCH_WEIGHT",
            &mut config.confidence.switch_weight,
        );
        override_from_env(
            "MASTERY_CONFIDENCE_MAX_TIME_MS",
            &mut config.confidence.max_time_ms,
        );
        override_from_env(
            "MASTERY_CONFIDENCE_MAX_SWITCHES",
            &mut config.confidence.max_switches,
        );
        override_from_env(
            "MASTERY_REVIEW_BASE_INTERVAL_MS",
            &mut config.review.base_interval_ms,
        );
        override_from_env(
            "MASTERY_REVIEW_THRESHOLD",
            &mut config.review.mastery_threshold,
        );
        override_from_env("MASTERY_REVIEW_DECAY_RATE", &mut config.review.decay_rate);
        override_from_env(
            "MASTERY_REVIEW_SCALE_FACTOR",
            &mut config.review.mastery_scale_factor,
        );

        config
    }

    /// Strict check for callers that prefer rejecting a bad config over
    /// silently repairing it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("masteryInit", self.mastery_init)?;
        check_positive("kBase", self.k_base)?;
        if self.k_base > MAX_K_BASE {
            return Err(ConfigError::invalid(
                "kBase",
                format!("{} exceeds {}", self.k_base, MAX_K_BASE),
            ));
        }

        check_unit("difficulty.easy", self.difficulty.easy)?;
        check_unit("difficulty.medium", self.difficulty.medium)?;
        check_unit("difficulty.hard", self.difficulty.hard)?;

        let c = &self.confidence;
        check_non_negative("confidence.timeWeight", c.time_weight)?;
        check_non_negative("confidence.switchWeight", c.switch_weight)?;
        let sum = c.time_weight + c.switch_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::invalid(
                "confidence",
                format!("timeWeight + switchWeight = {sum}, expected 1"),
            ));
        }
        check_positive("confidence.maxTimeMs", c.max_time_ms)?;
        check_positive("confidence.maxSwitches", c.max_switches)?;

        let r = &self.review;
        check_positive("review.baseIntervalMs", r.base_interval_ms)?;
        if r.base_interval_ms > MAX_BASE_INTERVAL_MS {
            return Err(ConfigError::invalid(
                "review.baseIntervalMs",
                format!("{} exceeds {}", r.base_interval_ms, MAX_BASE_INTERVAL_MS),
            ));
        }
        check_unit("review.masteryThreshold", r.mastery_threshold)?;
        check_positive("review.decayRate", r.decay_rate)?;
        check_positive("review.masteryScaleFactor", r.mastery_scale_factor)?;
        if r.mastery_scale_factor > MAX_MASTERY_SCALE_FACTOR {
            return Err(ConfigError::invalid(
                "review.masteryScaleFactor",
                format!(
                    "{} exceeds {}",
                    r.mastery_scale_factor, MAX_MASTERY_SCALE_FACTOR
                ),
            ));
        }

        Ok(())
    }

    /// Coerces every field into its valid domain. Non-finite or
    /// non-positive values fall back to the default, finite out-of-range
    /// values are clamped, and the confidence weights are normalized to sum
    /// to 1.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();

        let mastery_init = coerce("masteryInit", self.mastery_init, defaults.mastery_init, |v| {
            v.is_finite().then(|| v.clamp(0.0, 1.0))
        });
        let k_base = coerce("kBase", self.k_base, defaults.k_base, |v| {
            (v.is_finite() && v > 0.0).then(|| v.min(MAX_K_BASE))
        });

        let unit = |v: f64| v.is_finite().then(|| v.clamp(0.0, 1.0));
        let difficulty = DifficultyTiers {
            easy: coerce("difficulty.easy", self.difficulty.easy, defaults.difficulty.easy, unit),
            medium: coerce(
                "difficulty.medium",
                self.difficulty.medium,
                defaults.difficulty.medium,
                unit,
            ),
            hard: coerce("difficulty.hard", self.difficulty.hard, defaults.difficulty.hard, unit),
        };

        let confidence = sanitize_confidence(self.confidence, defaults.confidence);
        let review = sanitize_review(self.review, defaults.review);

        Self {
            mastery_init,
            k_base,
            difficulty,
            confidence,
            review,
        }
    }
}

fn sanitize_confidence(c: ConfidenceConfig, defaults: ConfidenceConfig) -> ConfidenceConfig {
    let weights_usable = c.time_weight.is_finite()
        && c.switch_weight.is_finite()
        && c.time_weight >= 0.0
        && c.switch_weight >= 0.0
        && c.time_weight + c.switch_weight > 0.0;

    let (time_weight, switch_weight) = if weights_usable {
        let sum = c.time_weight + c.switch_weight;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            tracing::warn!(
                time_weight = c.time_weight,
                switch_weight = c.switch_weight,
                "confidence weights do not sum to 1, normalizing"
            );
            // Scale by the larger weight first so the sum cannot overflow.
            let larger = c.time_weight.max(c.switch_weight);
            let (t, s) = (c.time_weight / larger, c.switch_weight / larger);
            (t / (t + s), s / (t + s))
        } else {
            (c.time_weight, c.switch_weight)
        }
    } else {
        tracing::warn!(
            time_weight = c.time_weight,
            switch_weight = c.switch_weight,
            "unusable confidence weights, falling back to defaults"
        );
        (defaults.time_weight, defaults.switch_weight)
    };

    let positive = |v: f64| (v.is_finite() && v > 0.0).then_some(v);
    ConfidenceConfig {
        time_weight,
        switch_weight,
        max_time_ms: coerce("confidence.maxTimeMs", c.max_time_ms, defaults.max_time_ms, positive),
        max_switches: coerce(
            "confidence.maxSwitches",
            c.max_switches,
            defaults.max_switches,
            positive,
        ),
    }
}

fn sanitize_review(r: ReviewConfig, defaults: ReviewConfig) -> ReviewConfig {
    ReviewConfig {
        base_interval_ms: coerce(
            "review.baseIntervalMs",
            r.base_interval_ms,
            defaults.base_interval_ms,
            |v| (v.is_finite() && v > 0.0).then(|| v.clamp(1.0, MAX_BASE_INTERVAL_MS)),
        ),
        mastery_threshold: coerce(
            "review.masteryThreshold",
            r.mastery_threshold,
            defaults.mastery_threshold,
            |v| v.is_finite().then(|| v.clamp(0.0, 1.0)),
        ),
        decay_rate: coerce("review.decayRate", r.decay_rate, defaults.decay_rate, |v| {
            (v.is_finite() && v > 0.0).then_some(v)
        }),
        mastery_scale_factor: coerce(
            "review.masteryScaleFactor",
            r.mastery_scale_factor,
            defaults.mastery_scale_factor,
            |v| (v.is_finite() && v > 0.0).then(|| v.min(MAX_MASTERY_SCALE_FACTOR)),
        ),
    }
}

fn coerce(field: &'static str, value: f64, default: f64, accept: impl Fn(f64) -> Option<f64>) -> f64 {
    match accept(value) {
        Some(v) if v == value => v,
        Some(v) => {
            tracing::warn!(field, value, coerced = v, "config value out of range, clamping");
            v
        }
        None => {
            tracing::warn!(field, value, default, "invalid config value, using default");
            default
        }
    }
}

fn override_from_env(key: &str, slot: &mut f64) {
    if let Ok(val) = std::env::var(key) {
        match val.trim().parse::<f64>() {
            Ok(parsed) => *slot = parsed,
            Err(_) => tracing::warn!(key, value = %val, "ignoring unparseable env override"),
        }
    }
}

fn check_unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} is outside [0, 1]")))
    }
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be positive")))
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be non-negative")))
    }
}
