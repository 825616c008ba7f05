//! Per-unit progress tracking
//!
//! Keeps the `(seen, correct)` record of every learning unit, split into
//! a foundational and an elevated sub-map, each persisted as its own JSON
//! snapshot.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Mapping from learning unit to its record, in enumeration order
pub type UnitStats = IndexMap<String, ProgressRecord>;

/// A record whose correct count would exceed its attempt count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{correct} correct answers out of only {seen} attempts")]
pub struct InvalidRecord {
    pub seen: u64,
    pub correct: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The stats file exists but is not a unit -> [seen, correct] mapping
    #[error("progress file {path:?} is corrupt: {source}")]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("progress file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode progress for {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("update to '{unit}' rejected: {source}")]
    Invariant {
        unit: String,
        #[source]
        source: InvalidRecord,
    },
}

/// Attempt and success counts for one learning unit.
///
/// Serialized as a two element array `[seen, correct]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(u64, u64)", into = "(u64, u64)")]
pub struct ProgressRecord {
    seen: u64,
    correct: u64,
}

impl ProgressRecord {
    pub fn new(seen: u64, correct: u64) -> Result<Self, InvalidRecord> {
        if correct > seen {
            return Err(InvalidRecord { seen, correct });
        }
        Ok(Self { seen, correct })
    }

    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn correct(&self) -> u64 {
        self.correct
    }

    /// Share of correct attempts, `None` while the unit has never been seen
    pub fn accuracy(&self) -> Option<f64> {
        if self.seen == 0 {
            None
        } else {
            Some(self.correct as f64 / self.seen as f64)
        }
    }

    fn add(&self, seen_delta: u64, correct_delta: u64) -> Result<Self, InvalidRecord> {
        Self::new(
            self.seen.saturating_add(seen_delta),
            self.correct.saturating_add(correct_delta),
        )
    }
}

impl TryFrom<(u64, u64)> for ProgressRecord {
    type Error = InvalidRecord;

    fn try_from((seen, correct): (u64, u64)) -> Result<Self, Self::Error> {
        Self::new(seen, correct)
    }
}

impl From<ProgressRecord> for (u64, u64) {
    fn from(record: ProgressRecord) -> Self {
        (record.seen, record.correct)
    }
}

/// The two disjoint partitions of learning units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Kana (or an open-ended word list), practiced first
    Foundational,
    /// Corpus-ordered kanji, introduced one at a time
    Elevated,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Foundational => "foundational",
            Tier::Elevated => "elevated",
        }
    }
}

/// Load a stats snapshot, creating it from `seed` when the file is absent
pub fn load_stats<I>(path: &Path, seed: I) -> Result<UnitStats, StoreError>
where
    I: IntoIterator<Item = String>,
{
    if let Some(stats) = read_stats(path)? {
        return Ok(stats);
    }

    let stats: UnitStats = seed
        .into_iter()
        .map(|unit| (unit, ProgressRecord::default()))
        .collect();
    save_stats(path, &stats)?;
    info!("Initialized {} units at {:?}", stats.len(), path);
    Ok(stats)
}

/// Read a stats snapshot without creating it; `None` when absent
pub fn read_stats(path: &Path) -> Result<Option<UnitStats>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::CorruptState {
            path: path.to_path_buf(),
            source,
        })
}

/// Overwrite the snapshot at `path` with the full mapping
pub fn save_stats(path: &Path, stats: &UnitStats) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string(stats).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}

/// Owner of both progress sub-maps and their backing files
#[derive(Debug)]
pub struct ProgressStore {
    foundational: UnitStats,
    elevated: UnitStats,
    foundational_path: PathBuf,
    elevated_path: PathBuf,
    dirty: HashSet<Tier>,
}

impl ProgressStore {
    /// Open both snapshots, seeding the foundational one on first run
    pub fn open<I>(foundational_path: &Path, elevated_path: &Path, seed: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = String>,
    {
        let foundational = load_stats(foundational_path, seed)?;
        let elevated = load_stats(elevated_path, std::iter::empty())?;

        debug!(
            "Loaded {} foundational and {} elevated units",
            foundational.len(),
            elevated.len()
        );

        Ok(Self::from_parts(foundational, elevated, foundational_path, elevated_path))
    }

    /// Open whatever snapshots exist, treating missing ones as empty.
    /// Nothing is written, so reporting never initializes a data directory.
    pub fn snapshot(foundational_path: &Path, elevated_path: &Path) -> Result<Self, StoreError> {
        let foundational = read_stats(foundational_path)?.unwrap_or_default();
        let elevated = read_stats(elevated_path)?.unwrap_or_default();
        Ok(Self::from_parts(foundational, elevated, foundational_path, elevated_path))
    }

    fn from_parts(
        foundational: UnitStats,
        elevated: UnitStats,
        foundational_path: &Path,
        elevated_path: &Path,
    ) -> Self {
        Self {
            foundational,
            elevated,
            foundational_path: foundational_path.to_path_buf(),
            elevated_path: elevated_path.to_path_buf(),
            dirty: HashSet::new(),
        }
    }

    pub fn tier(&self, tier: Tier) -> &UnitStats {
        match tier {
            Tier::Foundational => &self.foundational,
            Tier::Elevated => &self.elevated,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut UnitStats {
        match tier {
            Tier::Foundational => &mut self.foundational,
            Tier::Elevated => &mut self.elevated,
        }
    }

    fn path(&self, tier: Tier) -> &Path {
        match tier {
            Tier::Foundational => &self.foundational_path,
            Tier::Elevated => &self.elevated_path,
        }
    }

    /// Combined view: foundational units first, then elevated, each in
    /// enumeration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProgressRecord)> {
        self.foundational
            .iter()
            .chain(self.elevated.iter())
            .map(|(unit, record)| (unit.as_str(), record))
    }

    pub fn get(&self, unit: &str) -> Option<&ProgressRecord> {
        self.foundational.get(unit).or_else(|| self.elevated.get(unit))
    }

    pub fn tier_of(&self, unit: &str) -> Option<Tier> {
        if self.foundational.contains_key(unit) {
            Some(Tier::Foundational)
        } else if self.elevated.contains_key(unit) {
            Some(Tier::Elevated)
        } else {
            None
        }
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.tier_of(unit).is_some()
    }

    /// Units of a tier with at least one recorded attempt
    pub fn attempted(&self, tier: Tier) -> usize {
        self.tier(tier).values().filter(|r| r.seen() > 0).count()
    }

    /// Add deltas to a unit's record, creating a zero record in `tier` if
    /// the unit is not tracked yet. A unit already tracked keeps its tier.
    ///
    /// Rejects, without mutating, any update that would leave
    /// `correct > seen`. Call [`ProgressStore::flush`] to persist.
    pub fn increment(
        &mut self,
        unit: &str,
        tier: Tier,
        seen_delta: u64,
        correct_delta: u64,
    ) -> Result<ProgressRecord, StoreError> {
        let tier = self.tier_of(unit).unwrap_or(tier);
        let current = self.tier(tier).get(unit).copied().unwrap_or_default();

        let updated = current
            .add(seen_delta, correct_delta)
            .map_err(|source| StoreError::Invariant {
                unit: unit.to_string(),
                source,
            })?;

        self.tier_mut(tier).insert(unit.to_string(), updated);
        self.dirty.insert(tier);
        Ok(updated)
    }

    /// Start tracking `unit` with a zero record and persist its tier
    /// immediately. Returns `false` if the unit was already tracked.
    pub fn register(&mut self, unit: &str, tier: Tier) -> Result<bool, StoreError> {
        if self.contains(unit) {
            return Ok(false);
        }
        self.tier_mut(tier)
            .insert(unit.to_string(), ProgressRecord::default());
        self.save_tier(tier)?;
        Ok(true)
    }

    /// Persist every tier touched since the last save
    pub fn flush(&mut self) -> Result<(), StoreError> {
        for tier in [Tier::Foundational, Tier::Elevated] {
            if self.dirty.contains(&tier) {
                self.save_tier(tier)?;
            }
        }
        Ok(())
    }

    pub fn save_tier(&mut self, tier: Tier) -> Result<(), StoreError> {
        save_stats(self.path(tier), self.tier(tier))?;
        self.dirty.remove(&tier);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(units: &[&str]) -> Vec<String> {
        units.iter().map(|u| u.to_string()).collect()
    }

    fn open_store(dir: &TempDir, units: &[&str]) -> ProgressStore {
        ProgressStore::open(
            &dir.path().join("foundational.json"),
            &dir.path().join("elevated.json"),
            seed(units),
        )
        .unwrap()
    }

    #[test]
    fn test_record_rejects_more_correct_than_seen() {
        assert!(ProgressRecord::new(3, 3).is_ok());
        assert_eq!(
            ProgressRecord::new(2, 3),
            Err(InvalidRecord { seen: 2, correct: 3 })
        );
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(ProgressRecord::default().accuracy(), None);
        assert_eq!(ProgressRecord::new(10, 9).unwrap().accuracy(), Some(0.9));
    }

    #[test]
    fn test_record_serializes_as_pair() {
        let record = ProgressRecord::new(10, 2).unwrap();
        assert_eq!(serde_json::to_string(&record).unwrap(), "[10,2]");
        let parsed: ProgressRecord = serde_json::from_str("[7,5]").unwrap();
        assert_eq!(parsed, ProgressRecord::new(7, 5).unwrap());
        assert!(serde_json::from_str::<ProgressRecord>("[1,5]").is_err());
    }

    #[test]
    fn test_load_creates_seeded_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("stats.json");

        let stats = load_stats(&path, seed(&["あ", "い"])).unwrap();
        assert!(path.exists());
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.get_index(0).map(|(k, _)| k.as_str()), Some("あ"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"{"あ":[0,0],"い":[0,0]}"#);
    }

    #[test]
    fn test_load_existing_ignores_seed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        std::fs::write(&path, r#"{"日":[4,3]}"#).unwrap();

        let stats = load_stats(&path, seed(&["あ"])).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["日"], ProgressRecord::new(4, 3).unwrap());
    }

    #[test]
    fn test_load_corrupt_file_fails_loudly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");

        for bad in ["not json", r#"["あ"]"#, r#"{"あ":[1]}"#, r#"{"あ":[1,2]}"#] {
            std::fs::write(&path, bad).unwrap();
            let err = load_stats(&path, seed(&["あ"])).unwrap_err();
            assert!(matches!(err, StoreError::CorruptState { .. }), "{bad}: {err}");
            assert_eq!(std::fs::read_to_string(&path).unwrap(), bad);
        }
    }

    #[test]
    fn test_snapshot_does_not_create_files() {
        let dir = TempDir::new().unwrap();
        let foundational = dir.path().join("foundational.json");
        let elevated = dir.path().join("elevated.json");

        let store = ProgressStore::snapshot(&foundational, &elevated).unwrap();
        assert_eq!(store.iter().count(), 0);
        assert!(!foundational.exists());
        assert!(!elevated.exists());

        std::fs::write(&foundational, r#"{"あ":[2,1]}"#).unwrap();
        let store = ProgressStore::snapshot(&foundational, &elevated).unwrap();
        assert_eq!(store.get("あ"), Some(&ProgressRecord::new(2, 1).unwrap()));
        assert!(!elevated.exists());
    }

    #[test]
    fn test_failed_save_is_reported_and_leaves_file_intact() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, &["あ"]);
        let path = dir.path().join("foundational.json");
        // occupy the temporary file name so the write cannot happen
        std::fs::create_dir(dir.path().join("foundational.tmp")).unwrap();

        store.increment("あ", Tier::Foundational, 1, 1).unwrap();
        let err = store.flush().unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }), "{err}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"あ":[0,0]}"#);
    }

    #[test]
    fn test_save_then_reload_is_identical() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, &["あ", "い", "う"]);
        store.increment("い", Tier::Foundational, 1, 1).unwrap();
        store.increment("う", Tier::Foundational, 1, 0).unwrap();
        store.register("日", Tier::Elevated).unwrap();
        store.flush().unwrap();

        let reloaded = open_store(&dir, &["ignored"]);
        assert_eq!(reloaded.tier(Tier::Foundational), store.tier(Tier::Foundational));
        assert_eq!(reloaded.tier(Tier::Elevated), store.tier(Tier::Elevated));
        let order: Vec<&str> = reloaded.iter().map(|(u, _)| u).collect();
        assert_eq!(order, vec!["あ", "い", "う", "日"]);
    }

    #[test]
    fn test_increment_creates_and_accumulates() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, &[]);

        store.increment("ねこ", Tier::Foundational, 1, 1).unwrap();
        let record = store.increment("ねこ", Tier::Foundational, 1, 0).unwrap();
        assert_eq!((record.seen(), record.correct()), (2, 1));
        assert_eq!(store.tier_of("ねこ"), Some(Tier::Foundational));
    }

    #[test]
    fn test_increment_keeps_existing_tier() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, &[]);
        store.register("日", Tier::Elevated).unwrap();

        store.increment("日", Tier::Foundational, 1, 1).unwrap();
        assert_eq!(store.tier_of("日"), Some(Tier::Elevated));
        assert!(store.tier(Tier::Foundational).is_empty());
    }

    #[test]
    fn test_increment_rejects_invariant_violation() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, &["あ"]);

        let err = store.increment("あ", Tier::Foundational, 0, 1).unwrap_err();
        assert!(matches!(err, StoreError::Invariant { .. }));
        assert_eq!(store.get("あ"), Some(&ProgressRecord::default()));
    }

    #[test]
    fn test_flush_only_writes_dirty_tiers() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, &["あ"]);
        let elevated_path = dir.path().join("elevated.json");
        std::fs::remove_file(&elevated_path).unwrap();

        store.increment("あ", Tier::Foundational, 1, 1).unwrap();
        store.flush().unwrap();

        assert!(!elevated_path.exists());
        let raw = std::fs::read_to_string(dir.path().join("foundational.json")).unwrap();
        assert_eq!(raw, r#"{"あ":[1,1]}"#);
    }

    #[test]
    fn test_register_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, &["あ"]);

        assert!(store.register("日", Tier::Elevated).unwrap());
        assert!(!store.register("日", Tier::Elevated).unwrap());
        assert!(!store.register("あ", Tier::Elevated).unwrap());
        assert_eq!(store.tier(Tier::Elevated).len(), 1);

        let raw = std::fs::read_to_string(dir.path().join("elevated.json")).unwrap();
        assert_eq!(raw, r#"{"日":[0,0]}"#);
    }

    #[test]
    fn test_attempted_counts_seen_units() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir, &["あ", "い", "う"]);
        store.increment("い", Tier::Foundational, 2, 1).unwrap();
        assert_eq!(store.attempted(Tier::Foundational), 1);
        assert_eq!(store.attempted(Tier::Elevated), 0);
        assert_eq!(store.iter().count(), 3);
    }
}
