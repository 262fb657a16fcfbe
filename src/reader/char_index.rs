use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::error::{Error, ErrorKind, Result};

/// Character (or letter) index: one `<char> <line> <line>*` row per indexed
/// character, where each line number points into the matching dictionary.
pub struct CharIndexReader {
    postings: HashMap<char, Vec<u32>>,
}

impl CharIndexReader {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("cannot read character index {}: {}", path.display(), e),
            )
        })?;

        let mut postings = HashMap::new();
        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let Some(head) = fields.next() else {
                continue;
            };

            let mut chars = head.chars();
            let (Some(character), None) = (chars.next(), chars.next()) else {
                return Err(Error::new(
                    ErrorKind::Parse,
                    format!("index key is not a single character in {}: {}", path.display(), head),
                ));
            };

            let mut lines = Vec::new();
            for field in fields {
                let number: u32 = field.parse().map_err(|_| {
                    Error::new(
                        ErrorKind::Parse,
                        format!("bad line number in {}: {}", path.display(), field),
                    )
                })?;
                lines.push(number);
            }

            postings.insert(character, lines);
        }

        info!(path = %path.display(), characters = postings.len(), "character index loaded");
        Ok(CharIndexReader { postings })
    }

    /// Dictionary line numbers for `character`; empty when unindexed.
    pub fn line_numbers(&self, character: char) -> &[u32] {
        self.postings
            .get(&character)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
