use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DictEntry;

/// One language's lexicon: `<word> <frequency>` lines, loaded into an
/// index-ordered entry list (line N is entry N-1) plus a frequency map.
///
/// Immutable after load; safe to share across worker threads.
pub struct DictionaryReader {
    entries: Vec<DictEntry>,
    frequencies: HashMap<String, u64>,
}

impl DictionaryReader {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("cannot read dictionary {}: {}", path.display(), e),
            )
        })?;

        let mut entries = Vec::new();
        let mut frequencies = HashMap::new();
        for line in text.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            let Some((word, freq)) = line.rsplit_once(' ') else {
                return Err(Error::new(
                    ErrorKind::Parse,
                    format!("malformed dictionary line in {}: {}", path.display(), line),
                ));
            };
            let frequency: u64 = freq.parse().map_err(|_| {
                Error::new(
                    ErrorKind::Parse,
                    format!("bad frequency in {}: {}", path.display(), line),
                )
            })?;

            frequencies.insert(word.to_string(), frequency);
            entries.push(DictEntry {
                word: word.to_string(),
                frequency,
            });
        }

        info!(path = %path.display(), words = entries.len(), "dictionary loaded");
        Ok(DictionaryReader {
            entries,
            frequencies,
        })
    }

    /// Frequency of `word`, 0 when absent.
    pub fn frequency(&self, word: &str) -> u64 {
        self.frequencies.get(word).copied().unwrap_or(0)
    }

    /// Word at the given 1-based line number, `None` when out of range.
    pub fn word_at(&self, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.entries.get(line - 1).map(|e| e.word.as_str())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.frequencies.contains_key(word)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DictEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> DictionaryReader {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "中国 100").unwrap();
        writeln!(file, "中央 50").unwrap();
        writeln!(file, "忠告 30").unwrap();
        file.flush().unwrap();
        DictionaryReader::load(file.path()).unwrap()
    }

    #[test]
    fn lines_are_one_based() {
        let dict = sample();
        assert_eq!(dict.word_at(1), Some("中国"));
        assert_eq!(dict.word_at(3), Some("忠告"));
        assert_eq!(dict.word_at(0), None);
        assert_eq!(dict.word_at(4), None);
    }

    #[test]
    fn frequency_defaults_to_zero() {
        let dict = sample();
        assert_eq!(dict.frequency("中国"), 100);
        assert_eq!(dict.frequency("不存在"), 0);
    }
}
