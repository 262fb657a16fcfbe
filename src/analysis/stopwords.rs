use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::error::{Error, ErrorKind, Result};

/// A stop-word set loaded line-by-line from a text file.
///
/// Trailing whitespace is stripped, blank lines are ignored and duplicates
/// collapse into one entry.
#[derive(Debug, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn empty() -> Self {
        StopWords::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("cannot read stop-words file {}: {}", path.display(), e),
            )
        })?;

        let mut words = HashSet::new();
        for line in text.lines() {
            let word = line.trim();
            if !word.is_empty() {
                words.insert(word.to_string());
            }
        }

        info!(path = %path.display(), count = words.len(), "stop-words loaded");
        Ok(StopWords { words })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
