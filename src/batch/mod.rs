//! Batch Mastery Recompute
//!
//! Every item is sanitized and updated on its own; there is no shared
//! accumulator and no ordering dependency between items. The sequential,
//! parallel and cancellable variants therefore return element-wise identical
//! results for the items they process.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::config::MasteryConfig;
use crate::elo::update_mastery;
use crate::sanitize::{sanitize_calculation, AttemptCalculation};
use crate::types::UpdateResult;

/// Single-item pipeline shared by all batch variants.
pub fn calculate(item: &AttemptCalculation, config: &MasteryConfig) -> UpdateResult {
    update_mastery(&sanitize_calculation(item, config), config)
}

/// Sequential batch update. Output has the same length and order as `items`.
pub fn batch_update(items: &[AttemptCalculation], config: &MasteryConfig) -> Vec<UpdateResult> {
    items.iter().map(|item| calculate(item, config)).collect()
}

/// Parallel batch update on the rayon pool. Results are in input order and
/// identical to [`batch_update`].
pub fn par_batch_update(items: &[AttemptCalculation], config: &MasteryConfig) -> Vec<UpdateResult> {
    tracing::debug!(items = items.len(), "parallel mastery recompute");
    items.par_iter().map(|item| calculate(item, config)).collect()
}

/// Sequential batch update that checks `cancel` before each item. Returns the
/// results computed before cancellation was observed, i.e. a prefix of what
/// [`batch_update`] would return.
pub fn batch_update_until(
    items: &[AttemptCalculation],
    config: &MasteryConfig,
    cancel: &AtomicBool,
) -> Vec<UpdateResult> {
    batch_update_while(items, config, |_| !cancel.load(Ordering::Relaxed))
}

/// Sequential batch update driven by a progress callback. `keep_going`
/// receives the number of completed items before each item; the first
/// `false` ends the run and the completed prefix is returned.
pub fn batch_update_while(
    items: &[AttemptCalculation],
    config: &MasteryConfig,
    mut keep_going: impl FnMut(usize) -> bool,
) -> Vec<UpdateResult> {
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        if !keep_going(results.len()) {
            tracing::debug!(
                completed = results.len(),
                total = items.len(),
                "mastery recompute cancelled"
            );
            break;
        }
        results.push(calculate(item, config));
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::RawValue;

    fn items() -> Vec<AttemptCalculation> {
        vec![
            AttemptCalculation::new(0.5, 0.4, 1, 3000, 1),
            AttemptCalculation::new(0.3, 0.6, 0, 8000, 3),
        ]
    }

    #[test]
    fn test_batch_update() {
        let config = MasteryConfig::default();
        let results = batch_update(&items(), &config);
        assert_eq!(results.len(), 2);
        assert!(results[0].new_mastery > 0.5);
        assert!(results[1].new_mastery < 0.3);
        for r in &results {
            assert!(r.k_factor > 0.0 && r.k_factor < 1.0);
            assert!(r.confidence > 0.0 && r.confidence <= 1.0);
        }
    }

    #[test]
    fn test_empty_batch() {
        let config = MasteryConfig::default();
        assert!(batch_update(&[], &config).is_empty());
        assert!(par_batch_update(&[], &config).is_empty());
        assert!(batch_update_until(&[], &config, &AtomicBool::new(false)).is_empty());
    }

    #[test]
    fn test_items_are_independent() {
        let config = MasteryConfig::default();
        let items = items();
        let together = batch_update(&items, &config);
        let alone: Vec<_> = items.iter().map(|i| calculate(i, &config)).collect();
        assert_eq!(together, alone);

        let mut reversed = items.clone();
        reversed.reverse();
        let mut back = batch_update(&reversed, &config);
        back.reverse();
        assert_eq!(together, back);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = MasteryConfig::default();
        let items: Vec<_> = (0..500)
            .map(|i| {
                let x = i as f64;
                AttemptCalculation::new((x * 0.37) % 1.0, (x * 0.11) % 1.0, i % 3 == 0, x * 40.0, i % 7)
            })
            .collect();
        assert_eq!(par_batch_update(&items, &config), batch_update(&items, &config));
    }

    #[test]
    fn test_malformed_items_still_produce_results() {
        let config = MasteryConfig::default();
        let items = vec![
            AttemptCalculation::default(),
            AttemptCalculation::new(f64::NAN, "hard", "yes", -5, RawValue::from(serde_json::json!({}))),
        ];
        let results = batch_update(&items, &config);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.new_mastery)));
    }

    #[test]
    fn test_cancelled_before_start() {
        let config = MasteryConfig::default();
        let cancel = AtomicBool::new(true);
        assert!(batch_update_until(&items(), &config, &cancel).is_empty());
    }

    #[test]
    fn test_stopped_mid_run_returns_strict_prefix() {
        let config = MasteryConfig::default();
        let items: Vec<_> = (0..20)
            .map(|i| AttemptCalculation::new(0.05 * f64::from(i), 0.5, i % 2, 500 * i, i % 4))
            .collect();
        let full = batch_update(&items, &config);

        let mut seen = Vec::new();
        let prefix = batch_update_while(&items, &config, |done| {
            seen.push(done);
            done < 7
        });
        assert_eq!(prefix.len(), 7);
        assert_eq!(prefix, full[..7]);
        assert_eq!(seen, (0..=7).collect::<Vec<_>>());
    }

    #[test]
    fn test_flag_raised_by_another_thread_keeps_a_prefix() {
        let config = MasteryConfig::default();
        let items: Vec<_> = (0..50_000)
            .map(|i| AttemptCalculation::new(f64::from(i % 100) / 100.0, 0.5, i % 2, i, i % 5))
            .collect();
        let full = batch_update(&items, &config);
        let cancel = AtomicBool::new(false);

        let partial = std::thread::scope(|s| {
            let worker = s.spawn(|| batch_update_until(&items, &config, &cancel));
            cancel.store(true, Ordering::Relaxed);
            worker.join().unwrap()
        });
        assert!(partial.len() <= full.len());
        assert_eq!(partial, full[..partial.len()]);
    }

    #[test]
    fn test_uncancelled_runs_to_completion() {
        let config = MasteryConfig::default();
        let cancel = AtomicBool::new(false);
        assert_eq!(
            batch_update_until(&items(), &config, &cancel),
            batch_update(&items(), &config)
        );
    }
}
