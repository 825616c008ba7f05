//! Frequency-ranked kanji corpus
//!
//! A newline-delimited list, most frequent first. Read-only: the
//! scheduler addresses it by line index and never writes to it.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::StoreError;

#[derive(Debug, Clone, Default)]
pub struct ElevatedCorpus {
    lines: Vec<String>,
}

impl ElevatedCorpus {
    /// Read the corpus at `path`. A missing file is an empty corpus.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Corpus {:?} not found, no kanji will be introduced", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: PathBuf::from(path),
                    source,
                })
            }
        };

        let lines: Vec<String> = content.lines().map(|l| l.trim().to_string()).collect();
        debug!("Loaded corpus with {} entries from {:?}", lines.len(), path);
        Ok(Self { lines })
    }

    #[cfg(test)]
    pub fn from_lines(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.trim().to_string()).collect(),
        }
    }

    /// Unit on 0-based line `idx`, or `None` past the end. Blank lines
    /// read as absent.
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.lines
            .get(idx)
            .map(String::as_str)
            .filter(|unit| !unit.is_empty())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_by_line_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kanji.txt");
        std::fs::write(&path, "日\n一\r\n 国 \n").unwrap();

        let corpus = ElevatedCorpus::open(&path).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.get(0), Some("日"));
        assert_eq!(corpus.get(1), Some("一"));
        assert_eq!(corpus.get(2), Some("国"));
        assert_eq!(corpus.get(3), None);
    }

    #[test]
    fn test_blank_line_reads_as_absent() {
        let corpus = ElevatedCorpus::from_lines(&["日", "  ", "国"]);
        assert_eq!(corpus.get(1), None);
        assert_eq!(corpus.get(2), Some("国"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let corpus = ElevatedCorpus::open(&dir.path().join("absent.txt")).unwrap();
        assert_eq!(corpus.len(), 0);
        assert_eq!(corpus.get(0), None);
    }
}
