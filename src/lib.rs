//! # danci-mastery - topic mastery engine
//!
//! Pure, synchronous computations that turn a stream of practice attempts
//! into a per-topic mastery estimate and a review schedule:
//!
//! - **Expected score** - logistic success probability, mastery vs. difficulty
//! - **Confidence** - how decisive an answer was (latency, answer switching)
//! - **K-factor** - per-attempt learning rate from difficulty and confidence
//! - **Mastery update** - bounded ELO-style correction
//! - **Time decay / review scheduling** - review priority and next due time
//! - **Batch** - independent bulk recompute, sequential or on rayon
//!
//! ## Design
//!
//! - **Total** - every compute function accepts any input and returns an
//!   in-range value; loosely typed input passes through [`sanitize`] first
//! - **Stateless** - [`MasteryEngine`] holds only an immutable config; the
//!   caller owns and persists [`MasteryState`]
//! - **Deterministic** - `now` is always an argument, batches are order
//!   independent
//!
//! ## Modules
//!
//! - [`elo`] - expected score, K-factor, mastery update
//! - [`confidence`] - confidence coefficient
//! - [`review`] - time decay, review weight, next review time
//! - [`batch`] - bulk recompute
//! - [`sanitize`] - raw input coercion
//! - [`config`] - configuration and loading
//! - [`types`] - shared types and constants
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use danci_mastery::{AttemptEvent, MasteryEngine};
//!
//! let engine = MasteryEngine::default();
//! let now = Utc::now();
//!
//! let event = AttemptEvent {
//!     topic_id: "fractions".to_string(),
//!     difficulty: 0.5,
//!     is_correct: true,
//!     response_time_ms: 2400.0,
//!     switch_count: 0,
//! };
//! let state = engine.apply_attempt(None, &event, now);
//! let decision = engine.schedule_state(&state, now);
//! assert!(decision.next_review_at > now);
//! ```

pub mod batch;
pub mod confidence;
pub mod config;
pub mod elo;
pub mod engine;
pub mod review;
pub mod sanitize;
pub mod types;

pub use config::{ConfidenceConfig, ConfigError, DifficultyTiers, MasteryConfig, ReviewConfig};
pub use engine::MasteryEngine;
pub use sanitize::{AttemptCalculation, RawValue, ValidatedAttempt};
pub use types::*;
