//! Storage module for kanaflow
//!
//! Owns the data directory layout (progress snapshots, kanji corpus,
//! history log, config) and provides status/statistics reporting.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub mod corpus;
pub mod history;
pub mod progress;

pub use corpus::ElevatedCorpus;
pub use history::{EventKind, HistoryEvent};
pub use progress::{ProgressRecord, ProgressStore, StoreError, Tier};

use crate::config::{self, Config, DEFAULT_CONFIG};
use crate::script::kana_alphabet;

/// Resolved data directory together with its configuration
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
    pub config: Config,
}

impl DataDir {
    /// Resolve the data directory and load its config
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        let root = match explicit {
            Some(dir) => dir,
            None => get_data_dir()?,
        };
        let config = config::load_config(&root.join("config.toml"))?;
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.exists()
    }

    fn file(&self, name: &Path) -> PathBuf {
        self.root.join(name)
    }

    pub fn foundational_path(&self) -> PathBuf {
        self.file(&self.config.files.foundational_stats)
    }

    pub fn elevated_path(&self) -> PathBuf {
        self.file(&self.config.files.elevated_stats)
    }

    pub fn corpus_path(&self) -> PathBuf {
        self.file(&self.config.files.corpus)
    }

    pub fn history_path(&self) -> PathBuf {
        self.file(&self.config.files.history)
    }

    /// Open the progress store, seeding the kana alphabet on first use
    pub fn open_store(&self) -> Result<ProgressStore, StoreError> {
        ProgressStore::open(&self.foundational_path(), &self.elevated_path(), kana_alphabet())
    }

    /// Read the progress snapshots as they are, without seeding
    pub fn snapshot_store(&self) -> Result<ProgressStore, StoreError> {
        ProgressStore::snapshot(&self.foundational_path(), &self.elevated_path())
    }

    pub fn open_corpus(&self) -> Result<ElevatedCorpus, StoreError> {
        ElevatedCorpus::open(&self.corpus_path())
    }

    /// Append to the history log. History is informational, so failures
    /// are logged rather than propagated.
    pub fn log_event(&self, event: HistoryEvent) {
        if let Err(e) = history::append(&self.history_path(), &event) {
            tracing::warn!("Could not append to history: {}", e);
        }
    }
}

fn get_data_dir() -> Result<PathBuf> {
    // Check for .kanaflow directory in current project first
    let cwd = std::env::current_dir()?;
    let local = cwd.join(".kanaflow");
    if local.exists() {
        return Ok(local);
    }

    // Fall back to home directory
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home.join(".kanaflow"))
}

/// Initialize the data directory: config, progress snapshots, corpus
pub async fn init(dir: &DataDir) -> Result<()> {
    std::fs::create_dir_all(dir.root())?;

    let config_path = dir.root().join("config.toml");
    if !config_path.exists() {
        std::fs::write(&config_path, DEFAULT_CONFIG)?;
        info!("Created default configuration at {:?}", config_path);
    }

    let store = dir.open_store()?;

    let corpus_path = dir.corpus_path();
    if !corpus_path.exists() {
        std::fs::write(&corpus_path, "")?;
        info!(
            "Created empty kanji corpus at {:?}; add one kanji per line, most frequent first",
            corpus_path
        );
    }

    info!(
        "kanaflow initialized at {:?} ({} kana tracked)",
        dir.root(),
        store.tier(Tier::Foundational).len()
    );
    Ok(())
}

/// Show current kanaflow status
pub async fn show_status(dir: &DataDir) -> Result<()> {
    println!("kanaflow Status");
    println!("===============");
    println!();

    if !dir.exists() {
        println!("Status: NOT INITIALIZED");
        println!("Run 'kanaflow init' to initialize kanaflow");
        return Ok(());
    }

    println!("Status: INITIALIZED");
    println!("Data directory: {:?}", dir.root());

    let store = dir.snapshot_store()?;
    let corpus = dir.open_corpus()?;

    let foundational = store.tier(Tier::Foundational);
    println!(
        "Foundational units: {} tracked, {} attempted",
        foundational.len(),
        store.attempted(Tier::Foundational)
    );
    println!(
        "Elevated units: {} introduced of {} in corpus",
        store.tier(Tier::Elevated).len(),
        corpus.len()
    );

    Ok(())
}

/// Show detailed progress statistics
pub async fn show_stats(dir: &DataDir) -> Result<()> {
    println!("kanaflow Statistics");
    println!("===================");
    println!();

    if !dir.exists() {
        println!("kanaflow not initialized. Run 'kanaflow init' first.");
        return Ok(());
    }

    let store = dir.snapshot_store()?;
    let selection = &dir.config.selection;

    println!("Progress:");
    println!("---------");
    for tier in [Tier::Foundational, Tier::Elevated] {
        let stats = store.tier(tier);
        let (seen, correct) = stats
            .values()
            .fold((0u64, 0u64), |(s, c), r| (s + r.seen(), c + r.correct()));
        let mastered = stats
            .values()
            .filter(|r| {
                r.seen() >= selection.min_exposure
                    && r.accuracy().is_some_and(|a| a >= selection.accuracy_threshold)
            })
            .count();

        if seen > 0 {
            let accuracy = correct as f64 / seen as f64 * 100.0;
            println!(
                "  {}: {} units, {} mastered, accuracy {:.1}% ({}/{} attempts)",
                tier.as_str(),
                stats.len(),
                mastered,
                accuracy,
                correct,
                seen
            );
        } else {
            println!("  {}: {} units, no attempts recorded", tier.as_str(), stats.len());
        }
    }

    // Weakest practiced units
    println!();
    println!("Weakest Units:");
    println!("--------------");

    let mut practiced: Vec<(&str, f64, u64)> = store
        .iter()
        .filter_map(|(u, r)| r.accuracy().map(|a| (u, a, r.seen())))
        .collect();
    practiced.sort_by(|a, b| a.1.total_cmp(&b.1));

    if practiced.is_empty() {
        println!("  No practice recorded yet.");
    }
    for (unit, accuracy, seen) in practiced.iter().take(5) {
        println!("  {} - {:.0}% over {} attempts", unit, accuracy * 100.0, seen);
    }

    // Recent activity
    println!();
    println!("Recent Activity:");
    println!("----------------");

    let events = history::recent(&dir.history_path(), 5)?;
    if events.is_empty() {
        println!("  No activity recorded yet.");
    }
    for event in events {
        let outcome = match event.correct {
            Some(true) => " (correct)",
            Some(false) => " (incorrect)",
            None => "",
        };
        println!(
            "  {} - {} {}{}",
            event.at.format("%Y-%m-%d %H:%M:%S"),
            event.kind.as_str(),
            event.units.join(""),
            outcome
        );
    }

    Ok(())
}

/// Debug: dump per-unit records
pub async fn debug_units(dir: &DataDir, limit: usize) -> Result<()> {
    if !dir.exists() {
        println!("No data directory found.");
        return Ok(());
    }

    let store = dir.snapshot_store()?;

    println!("Tracked units (showing up to {} per tier):", limit);
    println!("{}", "=".repeat(40));

    for tier in [Tier::Foundational, Tier::Elevated] {
        let stats = store.tier(tier);
        println!("\n[{}] ({} units):", tier.as_str(), stats.len());
        println!("{}", "-".repeat(40));

        for (unit, record) in stats.iter().take(limit) {
            let accuracy = record
                .accuracy()
                .map(|a| format!("{:.0}%", a * 100.0))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {} seen={} correct={} accuracy={}",
                unit,
                record.seen(),
                record.correct(),
                accuracy
            );
        }
    }

    Ok(())
}

/// Reset all progress back to the seeded alphabet
pub async fn reset(dir: &DataDir, confirmed: bool) -> Result<()> {
    if !confirmed {
        println!("This discards all recorded progress. Re-run with --yes to confirm.");
        return Ok(());
    }

    // Written directly so a corrupt snapshot can still be reset
    let seed: progress::UnitStats = kana_alphabet()
        .map(|unit| (unit, ProgressRecord::default()))
        .collect();
    progress::save_stats(&dir.foundational_path(), &seed)?;
    progress::save_stats(&dir.elevated_path(), &progress::UnitStats::new())?;
    history::clear(&dir.history_path())?;
    dir.log_event(HistoryEvent::now(EventKind::Reset, vec![], None));

    info!("Progress reset to {} kana", seed.len());
    println!("Progress reset ({} kana tracked)", seed.len());
    Ok(())
}
