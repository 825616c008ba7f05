//! Focus selection
//!
//! Decides which units the next practice turn is built around. The
//! guards run in a fixed order and the first one that fires wins:
//!
//! 1. cold start: too few kana attempted, introduce more kana
//! 2. accuracy: some practiced unit is below the accuracy threshold
//! 3. exposure: some tracked unit has been seen too rarely
//! 4. readiness: not enough kana attempted to move on to kanji
//! 5. introduction: bring in the next kanji from the corpus
//!
//! New material is never introduced while existing material is weak.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::SelectionConfig;
use crate::storage::{ElevatedCorpus, ProgressStore, StoreError, Tier};

pub mod recorder;

pub use recorder::{record, Stimulus};

/// Which branch of the policy produced a focus set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FocusCategory {
    IntroduceFoundational,
    DrillExisting,
    IntroduceElevated,
}

impl FocusCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusCategory::IntroduceFoundational => "INTRODUCE_FOUNDATIONAL",
            FocusCategory::DrillExisting => "DRILL_EXISTING",
            FocusCategory::IntroduceElevated => "INTRODUCE_ELEVATED",
        }
    }
}

/// Units for the next practice turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusSet {
    pub category: FocusCategory,
    pub units: Vec<String>,
}

impl FocusSet {
    fn new(category: FocusCategory, units: Vec<String>) -> Self {
        Self { category, units }
    }
}

/// Chooses focus sets from the store and the kanji corpus
pub struct FocusSelector<'a> {
    policy: &'a SelectionConfig,
    corpus: &'a ElevatedCorpus,
}

impl<'a> FocusSelector<'a> {
    pub fn new(policy: &'a SelectionConfig, corpus: &'a ElevatedCorpus) -> Self {
        Self { policy, corpus }
    }

    /// Pick up to `count` units for the next turn.
    ///
    /// Only the introduction branch mutates the store: the new kanji is
    /// registered and persisted before it is returned. A `count` of zero
    /// yields an empty drill set and leaves the store untouched.
    pub fn select_focus(&self, store: &mut ProgressStore, count: usize) -> Result<FocusSet, StoreError> {
        if count == 0 {
            return Ok(FocusSet::new(FocusCategory::DrillExisting, Vec::new()));
        }

        let attempted = store.attempted(Tier::Foundational);

        if attempted < self.policy.cold_start_minimum {
            debug!(
                "Cold start: {} of {} kana attempted",
                attempted, self.policy.cold_start_minimum
            );
            return Ok(FocusSet::new(
                FocusCategory::IntroduceFoundational,
                unattempted_foundational(store, count),
            ));
        }

        if let Some(units) = self.weakest_by_accuracy(store, count) {
            return Ok(FocusSet::new(FocusCategory::DrillExisting, units));
        }

        if let Some(units) = self.underexposed(store, count) {
            return Ok(FocusSet::new(FocusCategory::DrillExisting, units));
        }

        if attempted < self.policy.elevated_readiness {
            debug!(
                "Kanji gated: {} of {} kana attempted",
                attempted, self.policy.elevated_readiness
            );
            return Ok(FocusSet::new(
                FocusCategory::IntroduceFoundational,
                unattempted_foundational(store, count),
            ));
        }

        self.introduce_elevated(store, count)
    }

    /// Lowest-accuracy practiced units, if the worst is below threshold
    fn weakest_by_accuracy(&self, store: &ProgressStore, count: usize) -> Option<Vec<String>> {
        let mut ranked: Vec<(&str, f64)> = store
            .iter()
            .filter_map(|(unit, record)| record.accuracy().map(|acc| (unit, acc)))
            .collect();

        // sort_by is stable, ties keep enumeration order
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (worst, accuracy) = ranked.first()?;
        if *accuracy >= self.policy.accuracy_threshold {
            return None;
        }

        debug!("Drilling by accuracy: '{}' at {:.2}", worst, accuracy);
        Some(ranked.iter().take(count).map(|(u, _)| u.to_string()).collect())
    }

    /// Least-attempted units, if the least is below the exposure minimum
    fn underexposed(&self, store: &ProgressStore, count: usize) -> Option<Vec<String>> {
        let least = store.iter().map(|(_, record)| record.seen()).min()?;
        if least >= self.policy.min_exposure {
            return None;
        }

        debug!("Drilling by exposure: minimum seen count {}", least);
        Some(least_attempted(store, count))
    }

    fn introduce_elevated(&self, store: &mut ProgressStore, count: usize) -> Result<FocusSet, StoreError> {
        let mut cursor = store.tier(Tier::Elevated).len();

        let next = loop {
            match self.corpus.get(cursor) {
                None => break None,
                Some(unit) if store.contains(unit) => {
                    debug!("Corpus entry {} ('{}') already tracked, skipping", cursor, unit);
                    cursor += 1;
                }
                Some(unit) => break Some(unit.to_string()),
            }
        };

        let Some(unit) = next else {
            debug!("Corpus exhausted at line {}", cursor);
            return Ok(FocusSet::new(
                FocusCategory::DrillExisting,
                least_attempted(store, count),
            ));
        };

        let mut units = least_attempted(store, count.saturating_sub(1));
        store.register(&unit, Tier::Elevated)?;
        info!("Introduced '{}' from corpus line {}", unit, cursor);

        units.push(unit);
        Ok(FocusSet::new(FocusCategory::IntroduceElevated, units))
    }
}

fn unattempted_foundational(store: &ProgressStore, count: usize) -> Vec<String> {
    store
        .tier(Tier::Foundational)
        .iter()
        .filter(|(_, record)| record.seen() == 0)
        .take(count)
        .map(|(unit, _)| unit.clone())
        .collect()
}

fn least_attempted(store: &ProgressStore, count: usize) -> Vec<String> {
    let mut ranked: Vec<(&str, u64)> = store.iter().map(|(unit, record)| (unit, record.seen())).collect();
    ranked.sort_by_key(|&(_, seen)| seen);
    ranked.into_iter().take(count).map(|(u, _)| u.to_string()).collect()
}
