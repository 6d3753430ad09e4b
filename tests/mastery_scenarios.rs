//! End-to-end scenarios for the mastery engine.
//!
//! Covers the learning-session walkthroughs, malformed input handling and the
//! batch timing budget.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration as StdDuration, Instant};

use chrono::Duration;
use serde_json::json;

use common::{fixed_now, init_tracing};
use danci_mastery::{
    AttemptCalculation, AttemptEvent, MasteryConfig, MasteryEngine, RawValue,
};

#[test]
fn equal_mastery_and_difficulty_is_a_coin_flip() {
    let engine = MasteryEngine::default();
    assert_eq!(engine.expected_score(0.5, 0.5), 0.5);
}

#[test]
fn learning_session_trends_upward() {
    init_tracing();
    let engine = MasteryEngine::default();

    // (correct, response ms, switches)
    let session = [
        (1, 2000, 0),
        (0, 8000, 3),
        (1, 3000, 1),
        (1, 2500, 0),
        (1, 2200, 0),
    ];

    let mut mastery = 0.3;
    let mut history = vec![mastery];
    for (result, time, switches) in session {
        mastery = engine.calculate_new_mastery(mastery, 0.5, result, time, switches);
        history.push(mastery);
    }

    assert!(history[history.len() - 1] > history[0]);
    assert!(history.iter().all(|m| (0.0..=1.0).contains(m)));
}

#[test]
fn stateful_session_through_apply_attempt() {
    let engine = MasteryEngine::default();
    let start = fixed_now();

    let mut state = None;
    for (i, correct) in [true, false, true, true, true].into_iter().enumerate() {
        let event = AttemptEvent {
            topic_id: "photosynthesis".into(),
            difficulty: engine.difficulty_for(danci_mastery::DifficultyTier::Medium),
            is_correct: correct,
            response_time_ms: 3000.0,
            switch_count: u32::from(!correct),
        };
        let now = start + Duration::minutes(i as i64);
        state = Some(engine.apply_attempt(state.as_ref(), &event, now));
    }

    let state = state.unwrap();
    assert_eq!(state.review_count, 5);
    assert_eq!(state.last_reviewed_at, start + Duration::minutes(4));
    assert!(state.mastery > engine.initial_mastery());
}

#[test]
fn maximally_malformed_input_still_yields_a_mastery() {
    let engine = MasteryEngine::default();
    let m = engine.calculate_new_mastery(
        f64::NAN,
        RawValue::Missing,
        json!(null),
        "invalid",
        json!({}),
    );
    assert!(m.is_finite());
    assert!((0.0..=1.0).contains(&m));
}

#[test]
fn malformed_json_request_still_yields_a_mastery() {
    let engine = MasteryEngine::default();
    let item: AttemptCalculation = serde_json::from_str(
        r#"{"currentMastery":"NaN","difficulty":[1,2],"result":{"ok":true},"responseTime":-1e308,"switchCount":"many"}"#,
    )
    .unwrap();
    let result = engine.calculate(&item);
    assert!((0.0..=1.0).contains(&result.new_mastery));
    assert!(result.k_factor > 0.0 && result.k_factor < 1.0);
    assert!(result.confidence > 0.0 && result.confidence <= 1.0);
}

#[test]
fn out_of_range_inputs_do_not_panic() {
    let engine = MasteryEngine::default();
    for current in [-1.0, 2.0, f64::INFINITY, f64::NEG_INFINITY] {
        let m = engine.calculate_new_mastery(current, 0.5, 1, 3000, 1);
        assert!((0.0..=1.0).contains(&m));
    }
    let m = engine.calculate_new_mastery(0.0, 1.0, 0, 100_000, 50);
    assert!((0.0..=1.0).contains(&m));
    let m = engine.calculate_new_mastery(1.0, 0.0, 1, 0, 0);
    assert!((0.0..=1.0).contains(&m));
}

#[test]
fn weaker_topic_one_day_later_is_more_urgent() {
    let engine = MasteryEngine::default();
    let now = fixed_now();
    let yesterday = now - Duration::days(1);
    assert!(engine.review_weight(0.2, yesterday, now) > engine.review_weight(0.8, yesterday, now));
}

#[test]
fn hundred_identical_requests_are_fast_and_identical() {
    let engine = MasteryEngine::default();
    let items = vec![AttemptCalculation::new(0.5, 0.4, 1, 3000, 1); 100];

    let start = Instant::now();
    let results = engine.batch_update(&items);
    let elapsed = start.elapsed();

    assert!(elapsed < StdDuration::from_millis(100), "took {elapsed:?}");
    assert_eq!(results.len(), 100);
    assert!(results.iter().all(|r| *r == results[0]));
    assert_eq!(engine.par_batch_update(&items), results);
}

#[test]
fn single_update_is_fast() {
    let engine = MasteryEngine::default();
    let start = Instant::now();
    let m = engine.calculate_new_mastery(0.5, 0.4, 1, 3000, 1);
    assert!(start.elapsed() < StdDuration::from_millis(10));
    assert!(m > 0.5);
}

#[test]
fn cancelled_recompute_keeps_completed_prefix() {
    let engine = MasteryEngine::default();
    let items: Vec<_> = (0..10)
        .map(|i| AttemptCalculation::new(0.1 * f64::from(i), 0.5, i % 2, 1000 * i, 0))
        .collect();

    let full = engine.batch_update(&items);
    let none = engine.batch_update_until(&items, &AtomicBool::new(true));
    let all = engine.batch_update_until(&items, &AtomicBool::new(false));

    assert!(none.is_empty());
    assert_eq!(all, full);

    let cancel = AtomicBool::new(false);
    let partial = engine.batch_update_while(&items, |done| {
        if done == 4 {
            cancel.store(true, Ordering::Relaxed);
        }
        !cancel.load(Ordering::Relaxed)
    });
    assert_eq!(partial.len(), 4);
    assert_eq!(partial, full[..4]);
}

#[test]
fn config_from_json_drives_the_engine() {
    init_tracing();
    let config = MasteryConfig::from_json_str(
        r#"{"masteryInit":0.5,"review":{"baseIntervalMs":3600000,"masteryScaleFactor":1.0}}"#,
    )
    .unwrap();
    assert!(config.validate().is_ok());

    let engine = MasteryEngine::new(config);
    let now = fixed_now();
    assert_eq!(engine.initial_mastery(), 0.5);
    assert_eq!(engine.next_review_at(0.0, now), now + Duration::hours(1));
    assert_eq!(engine.next_review_at(1.0, now), now + Duration::hours(2));
    // Missing mastery falls back to the configured seed.
    assert_eq!(
        engine.next_review_at(RawValue::Missing, now),
        now + Duration::minutes(90)
    );
}

#[test]
fn invalid_config_is_repaired_not_fatal() {
    init_tracing();
    let config = MasteryConfig::from_json_str(
        r#"{"kBase":-3,"confidence":{"timeWeight":0,"switchWeight":0},"review":{"decayRate":-1}}"#,
    )
    .unwrap();
    assert!(config.validate().is_err());

    let engine = MasteryEngine::new(config);
    assert!(engine.config().validate().is_ok());
    assert_eq!(engine.confidence(0, 0), 1.0);
}
