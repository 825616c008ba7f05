//! Practice session operations
//!
//! One practice cycle is: ask for the next focus set, let the learner
//! answer, then record the tutor's verdict. Each step loads the store,
//! does its work and persists before returning, so a failed save stops
//! the cycle instead of silently dropping an outcome.

use anyhow::Result;
use tracing::info;

use crate::scheduler::{self, FocusCategory, FocusSelector, FocusSet, Stimulus};
use crate::storage::{DataDir, EventKind, HistoryEvent};
use crate::tutor::{self, TutorSignal};

/// Select the next focus set and print it for the presentation layer
pub async fn next_focus(dir: &DataDir, count: Option<usize>, json: bool) -> Result<FocusSet> {
    let count = count.unwrap_or(dir.config.selection.focus_count);
    let mut store = dir.open_store()?;
    let corpus = dir.open_corpus()?;

    let set = FocusSelector::new(&dir.config.selection, &corpus).select_focus(&mut store, count)?;

    if set.category == FocusCategory::IntroduceElevated {
        if let Some(unit) = set.units.last() {
            dir.log_event(HistoryEvent::now(EventKind::Introduced, vec![unit.clone()], None));
        }
    }

    if json {
        println!("{}", serde_json::to_string(&set)?);
    } else {
        println!("{}: {}", set.category.as_str(), set.units.join(" "));
    }

    Ok(set)
}

/// Record a practice outcome for every unit in `stimulus`
pub async fn record_outcome(dir: &DataDir, stimulus: Stimulus, incorrect: bool) -> Result<Vec<String>> {
    let mut store = dir.open_store()?;
    let affected = scheduler::record(&mut store, &stimulus, incorrect)?;

    if affected.is_empty() {
        println!("No tracked units in stimulus, nothing recorded");
        return Ok(affected);
    }

    dir.log_event(HistoryEvent::now(EventKind::Recorded, affected.clone(), Some(!incorrect)));
    info!(
        "Recorded {} for {} units",
        if incorrect { "miss" } else { "hit" },
        affected.len()
    );

    for unit in &affected {
        if let Some(record) = store.get(unit) {
            println!("{} {}/{}", unit, record.correct(), record.seen());
        }
    }

    Ok(affected)
}

/// Feed a raw tutor reply through the adapter and act on its signal
pub async fn apply_tutor_reply(dir: &DataDir, reply: &str) -> Result<()> {
    let signal = tutor::parse_reply(reply, dir.config.outcome.missing_marker)?;

    match signal {
        TutorSignal::Outcome(outcome) => {
            record_outcome(dir, Stimulus::Text(outcome.text), outcome.incorrect).await?;
            if outcome.request_next {
                next_focus(dir, None, false).await?;
            }
        }
        TutorSignal::NextExercise => {
            next_focus(dir, None, false).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Tier;
    use tempfile::TempDir;

    fn data_dir(tmp: &TempDir) -> DataDir {
        DataDir::resolve(Some(tmp.path().to_path_buf())).unwrap()
    }

    #[tokio::test]
    async fn test_cycle_persists_between_steps() {
        let tmp = TempDir::new().unwrap();
        let dir = data_dir(&tmp);

        let set = next_focus(&dir, Some(2), false).await.unwrap();
        assert_eq!(set.category, FocusCategory::IntroduceFoundational);
        assert_eq!(set.units, vec!["ぁ", "あ"]);

        record_outcome(&dir, Stimulus::Text(set.units.join("")), false).await.unwrap();

        let store = dir.open_store().unwrap();
        assert_eq!(store.attempted(Tier::Foundational), 2);

        let set = next_focus(&dir, Some(2), false).await.unwrap();
        assert_eq!(set.units, vec!["ぃ", "い"]);
    }

    #[tokio::test]
    async fn test_tutor_reply_records_miss() {
        let tmp = TempDir::new().unwrap();
        let dir = data_dir(&tmp);

        apply_tutor_reply(&dir, "[INCORRECT] ねこ").await.unwrap();

        let store = dir.open_store().unwrap();
        let record = store.get("ね").copied().unwrap();
        assert_eq!((record.seen(), record.correct()), (1, 0));
    }

    #[tokio::test]
    async fn test_tutor_reply_without_marker_is_rejected_by_default() {
        let tmp = TempDir::new().unwrap();
        let dir = data_dir(&tmp);

        assert!(apply_tutor_reply(&dir, "ねこ").await.is_err());
        let store = dir.open_store().unwrap();
        assert_eq!(store.attempted(Tier::Foundational), 0);
    }

    #[tokio::test]
    async fn test_introduction_logged_to_history() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[selection]\ncold_start_minimum = 0\nmin_exposure = 0\n").unwrap();
        std::fs::write(tmp.path().join("foundational_stats.json"), "{}").unwrap();
        std::fs::write(tmp.path().join("kanji_freq_list.txt"), "日\n").unwrap();
        let dir = data_dir(&tmp);

        let set = next_focus(&dir, Some(1), true).await.unwrap();
        assert_eq!(set.category, FocusCategory::IntroduceElevated);
        assert_eq!(set.units, vec!["日"]);

        let events = crate::storage::history::recent(&dir.history_path(), 5).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Introduced);
    }
}
