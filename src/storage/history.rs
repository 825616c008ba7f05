//! Activity history
//!
//! Append-only JSONL log of introductions and recorded outcomes. Purely
//! informational: the scheduler never reads it back.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Introduced,
    Recorded,
    Reset,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Introduced => "introduced",
            EventKind::Recorded => "recorded",
            EventKind::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub at: DateTime<Utc>,
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub units: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
}

impl HistoryEvent {
    pub fn now(kind: EventKind, units: Vec<String>, correct: Option<bool>) -> Self {
        Self {
            at: Utc::now(),
            kind,
            units,
            correct,
        }
    }
}

pub fn append(path: &Path, event: &HistoryEvent) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(event)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Most recent `limit` events, newest first. Unparsable lines are skipped.
pub fn recent(path: &Path, limit: usize) -> Result<Vec<HistoryEvent>> {
    if !path.exists() {
        return Ok(vec![]);
    }

    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HistoryEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => debug!("Skipping malformed history line: {}", e),
        }
    }

    events.reverse();
    events.truncate(limit);
    Ok(events)
}

pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
