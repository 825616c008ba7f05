//! Configuration for kanaflow
//!
//! Loaded from `config.toml` in the data directory. Every field has a
//! default so a partial (or missing) file is fine.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::tutor::MissingMarkerPolicy;

pub const DEFAULT_CONFIG: &str = r#"# kanaflow configuration

[selection]
# Drill any practiced unit whose accuracy falls below this share
accuracy_threshold = 0.9
# Drill any tracked unit seen fewer times than this
min_exposure = 10
# Keep introducing kana until this many have been attempted
cold_start_minimum = 5
# Attempted kana required before any kanji is introduced (0 disables)
elevated_readiness = 0
# Units per focus set
focus_count = 3

[outcome]
# What to do when a tutor reply carries no verdict marker:
# "reject", "assume_correct" or "assume_incorrect"
missing_marker = "reject"

[files]
foundational_stats = "foundational_stats.json"
elevated_stats = "elevated_stats.json"
corpus = "kanji_freq_list.txt"
history = "history.jsonl"
"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub selection: SelectionConfig,
    pub outcome: OutcomeConfig,
    pub files: FileConfig,
}

/// Thresholds driving the focus selection policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub accuracy_threshold: f64,
    pub min_exposure: u64,
    pub cold_start_minimum: usize,
    pub elevated_readiness: usize,
    pub focus_count: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold: 0.9,
            min_exposure: 10,
            cold_start_minimum: 5,
            elevated_readiness: 0,
            focus_count: 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutcomeConfig {
    pub missing_marker: MissingMarkerPolicy,
}

/// File names, relative to the data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub foundational_stats: PathBuf,
    pub elevated_stats: PathBuf,
    pub corpus: PathBuf,
    pub history: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            foundational_stats: PathBuf::from("foundational_stats.json"),
            elevated_stats: PathBuf::from("elevated_stats.json"),
            corpus: PathBuf::from("kanji_freq_list.txt"),
            history: PathBuf::from("history.jsonl"),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let threshold = self.selection.accuracy_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            bail!("selection.accuracy_threshold must be within [0, 1], got {}", threshold);
        }
        if self.selection.focus_count == 0 {
            bail!("selection.focus_count must be at least 1");
        }
        Ok(())
    }
}

/// Load configuration from file, falling back to defaults when absent
pub fn load_config(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(config_path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
