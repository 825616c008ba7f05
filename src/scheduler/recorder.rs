//! Outcome recording
//!
//! Turns a practice outcome into per-unit progress updates. Every unit in
//! the stimulus is a hit when the answer was right and a miss when it was
//! wrong; there is no partial credit.

use tracing::debug;

use crate::script::Script;
use crate::storage::{ProgressStore, StoreError, Tier};

/// What the learner practiced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stimulus {
    /// Japanese text, split into individual kana and kanji
    Text(String),
    /// Whole words tracked as units of their own.
    ///
    /// Words are always foundational, whatever script they are written
    /// in. A single-kanji word recorded before that kanji is introduced
    /// therefore lives in the foundational tier, counts toward the kana
    /// gates, and is skipped when the corpus reaches it.
    Words(Vec<String>),
}

/// Distinct units of a stimulus with their tiers, in first-appearance order
pub fn extract_units(stimulus: &Stimulus) -> Vec<(String, Tier)> {
    let mut units: Vec<(String, Tier)> = Vec::new();

    match stimulus {
        Stimulus::Text(text) => {
            for c in text.chars() {
                let Some(script) = Script::of(c) else {
                    continue;
                };
                let tier = if script.is_kana() {
                    Tier::Foundational
                } else {
                    Tier::Elevated
                };
                let unit = c.to_string();
                if !units.iter().any(|(u, _)| *u == unit) {
                    units.push((unit, tier));
                }
            }
        }
        Stimulus::Words(words) => {
            for word in words {
                let word = word.trim();
                if !word.is_empty() && !units.iter().any(|(u, _)| u == word) {
                    units.push((word.to_string(), Tier::Foundational));
                }
            }
        }
    }

    units
}

/// Record an outcome and persist the store.
///
/// Kanji only enter the store through corpus introduction, so an
/// ideograph that is not tracked yet is ignored. Returns the units whose
/// records changed.
pub fn record(store: &mut ProgressStore, stimulus: &Stimulus, was_incorrect: bool) -> Result<Vec<String>, StoreError> {
    let correct_delta = if was_incorrect { 0 } else { 1 };
    let mut affected = Vec::new();

    for (unit, tier) in extract_units(stimulus) {
        if tier == Tier::Elevated && !store.contains(&unit) {
            debug!("Ignoring '{}', not introduced yet", unit);
            continue;
        }
        store.increment(&unit, tier, 1, correct_delta)?;
        affected.push(unit);
    }

    if !affected.is_empty() {
        store.flush()?;
    }

    debug!(
        "Recorded {} for {} units",
        if was_incorrect { "miss" } else { "hit" },
        affected.len()
    );
    Ok(affected)
}
