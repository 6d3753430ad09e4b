//! Mastery engine facade.
//!
//! [`MasteryEngine`] owns one sanitized [`MasteryConfig`] and nothing else.
//! All methods take `&self`, so an engine can be shared across threads and
//! several engines with different configs can run side by side.

use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Utc};

use crate::batch;
use crate::confidence;
use crate::config::MasteryConfig;
use crate::elo;
use crate::review;
use crate::sanitize::{
    sanitize_difficulty, sanitize_event, sanitize_mastery, sanitize_response_time,
    sanitize_switch_count, AttemptCalculation, RawValue,
};
use crate::types::{
    AttemptEvent, Confidence, DifficultyTier, Mastery, MasteryState, ScheduleDecision,
    UpdateResult,
};

#[derive(Debug, Clone)]
pub struct MasteryEngine {
    config: MasteryConfig,
}

impl Default for MasteryEngine {
    fn default() -> Self {
        Self::new(MasteryConfig::default())
    }
}

impl MasteryEngine {
    /// Creates an engine. Out-of-domain config values are repaired (and
    /// logged) rather than rejected; call [`MasteryConfig::validate`] first
    /// to reject them instead.
    pub fn new(config: MasteryConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(MasteryConfig::from_env())
    }

    pub fn config(&self) -> &MasteryConfig {
        &self.config
    }

    // ==================== Collaborator helpers ====================

    /// Seed mastery for a topic that has never been attempted.
    pub fn initial_mastery(&self) -> f64 {
        self.config.mastery_init
    }

    /// Numeric difficulty for a named tier.
    pub fn difficulty_for(&self, tier: DifficultyTier) -> f64 {
        self.config.difficulty.get(tier)
    }

    /// Whether `mastery` reaches the configured mastered threshold.
    pub fn is_mastered(&self, mastery: impl Into<RawValue>) -> bool {
        self.mastery(mastery).value() >= self.config.review.mastery_threshold
    }

    /// First-ever state for a topic, before any attempt is applied.
    pub fn seed_state(&self, topic_id: impl Into<String>, now: DateTime<Utc>) -> MasteryState {
        MasteryState {
            topic_id: topic_id.into(),
            mastery: self.config.mastery_init,
            last_reviewed_at: now,
            review_count: 0,
        }
    }

    // ==================== Scoring ====================

    /// See [`elo::expected_score`].
    pub fn expected_score(&self, mastery: f64, difficulty: f64) -> f64 {
        elo::expected_score(mastery, difficulty)
    }

    /// Confidence coefficient for a raw response time and switch count.
    pub fn confidence(
        &self,
        response_time_ms: impl Into<RawValue>,
        switch_count: impl Into<RawValue>,
    ) -> f64 {
        confidence::confidence(
            sanitize_response_time(&response_time_ms.into()),
            sanitize_switch_count(&switch_count.into()),
            &self.config.confidence,
        )
        .value()
    }

    /// K-factor for a raw difficulty and a confidence value. A non-finite
    /// confidence is treated as full confidence.
    pub fn k_factor(&self, difficulty: impl Into<RawValue>, confidence: f64) -> f64 {
        elo::k_factor(
            sanitize_difficulty(&difficulty.into(), &self.config),
            Confidence::from_f64(confidence).unwrap_or(Confidence::FULL),
            self.config.k_base,
        )
    }

    // ==================== Mastery updates ====================

    /// New mastery after one attempt. Total: any input produces a finite
    /// value in [0, 1].
    pub fn calculate_new_mastery(
        &self,
        current_mastery: impl Into<RawValue>,
        difficulty: impl Into<RawValue>,
        result: impl Into<RawValue>,
        response_time_ms: impl Into<RawValue>,
        switch_count: impl Into<RawValue>,
    ) -> f64 {
        let item = AttemptCalculation::new(
            current_mastery,
            difficulty,
            result,
            response_time_ms,
            switch_count,
        );
        self.calculate(&item).new_mastery
    }

    /// Full update result for one raw calculation request.
    pub fn calculate(&self, item: &AttemptCalculation) -> UpdateResult {
        batch::calculate(item, &self.config)
    }

    /// Applies a storage event to the stored state, creating the state on
    /// the first attempt. The input state is left untouched.
    pub fn apply_attempt(
        &self,
        state: Option<&MasteryState>,
        event: &AttemptEvent,
        now: DateTime<Utc>,
    ) -> MasteryState {
        let seeded;
        let state = match state {
            Some(state) => {
                if state.topic_id != event.topic_id {
                    tracing::warn!(
                        state_topic = %state.topic_id,
                        event_topic = %event.topic_id,
                        "attempt applied to a different topic's state"
                    );
                }
                state
            }
            None => {
                seeded = self.seed_state(event.topic_id.clone(), now);
                &seeded
            }
        };

        let attempt = sanitize_event(event, Some(state.mastery), &self.config);
        let update = elo::update_mastery(&attempt, &self.config);

        MasteryState {
            topic_id: event.topic_id.clone(),
            mastery: update.new_mastery,
            last_reviewed_at: now,
            review_count: state.review_count.saturating_add(1),
        }
    }

    // ==================== Batch ====================

    /// Sequential recompute; results match `items` in length and order.
    pub fn batch_update(&self, items: &[AttemptCalculation]) -> Vec<UpdateResult> {
        batch::batch_update(items, &self.config)
    }

    /// Recompute on the rayon pool, identical to [`Self::batch_update`].
    pub fn par_batch_update(&self, items: &[AttemptCalculation]) -> Vec<UpdateResult> {
        batch::par_batch_update(items, &self.config)
    }

    /// Sequential recompute that stops once `cancel` is set and returns the
    /// completed prefix.
    pub fn batch_update_until(
        &self,
        items: &[AttemptCalculation],
        cancel: &AtomicBool,
    ) -> Vec<UpdateResult> {
        batch::batch_update_until(items, &self.config, cancel)
    }

    /// Sequential recompute that asks `keep_going` with the number of
    /// completed items before each item and stops at the first `false`.
    pub fn batch_update_while(
        &self,
        items: &[AttemptCalculation],
        keep_going: impl FnMut(usize) -> bool,
    ) -> Vec<UpdateResult> {
        batch::batch_update_while(items, &self.config, keep_going)
    }

    // ==================== Review scheduling ====================

    /// Retained-knowledge weight in (0, 1] for the time since the last review.
    pub fn decay_weight(&self, last_reviewed_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        review::decay_weight(
            review::days_since(last_reviewed_at, now),
            self.config.review.decay_rate,
        )
    }

    /// Review priority in [0, 2]; higher is more urgent.
    pub fn review_weight(
        &self,
        mastery: impl Into<RawValue>,
        last_reviewed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> f64 {
        review::review_weight(self.mastery(mastery), self.decay_weight(last_reviewed_at, now))
    }

    /// Next due time, always after `now` unless `now` is the last
    /// representable instant.
    pub fn next_review_at(&self, mastery: impl Into<RawValue>, now: DateTime<Utc>) -> DateTime<Utc> {
        review::next_review_at(self.mastery(mastery), now, &self.config.review)
    }

    /// Review priority and next due time together.
    pub fn schedule(
        &self,
        mastery: impl Into<RawValue>,
        last_reviewed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ScheduleDecision {
        review::schedule(self.mastery(mastery), last_reviewed_at, now, &self.config.review)
    }

    /// Schedule for a stored state.
    pub fn schedule_state(&self, state: &MasteryState, now: DateTime<Utc>) -> ScheduleDecision {
        self.schedule(state.mastery, state.last_reviewed_at, now)
    }

    fn mastery(&self, raw: impl Into<RawValue>) -> Mastery {
        sanitize_mastery(&raw.into(), &self.config)
    }
}
