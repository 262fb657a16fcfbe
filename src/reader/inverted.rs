use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::error::{Error, ErrorKind, Result};

/// Inverted index reader: `<term> (<docid> <weight>)*` rows with docids
/// ascending and L2-normalized weights.
pub struct InvertedIndexReader {
    postings: HashMap<String, Vec<(u32, f64)>>,
}

impl InvertedIndexReader {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("cannot read inverted index {}: {}", path.display(), e),
            )
        })?;

        let mut postings = HashMap::new();
        for line in text.lines() {
            let mut fields = line.split_whitespace();
            let Some(term) = fields.next() else {
                continue;
            };

            let rest: Vec<&str> = fields.collect();
            if rest.len() % 2 != 0 {
                return Err(Error::new(
                    ErrorKind::Parse,
                    format!("odd posting field count in {}: {}", path.display(), term),
                ));
            }

            let mut list = Vec::with_capacity(rest.len() / 2);
            for pair in rest.chunks_exact(2) {
                let docid: u32 = pair[0].parse().map_err(|_| {
                    Error::new(
                        ErrorKind::Parse,
                        format!("bad docid in {} for term {}", path.display(), term),
                    )
                })?;
                let weight: f64 = pair[1].parse().map_err(|_| {
                    Error::new(
                        ErrorKind::Parse,
                        format!("bad weight in {} for term {}", path.display(), term),
                    )
                })?;
                list.push((docid, weight));
            }

            postings.insert(term.to_string(), list);
        }

        info!(path = %path.display(), terms = postings.len(), "inverted index loaded");
        Ok(InvertedIndexReader { postings })
    }

    /// Posting list for `term`, ordered by docid; empty when unknown.
    pub fn postings(&self, term: &str) -> &[(u32, f64)] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }
}
