use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::PageOffset;

/// Page offset table: `<docid> <offset> <length>` rows mapping a document to
/// its byte span in the pages file.
pub struct OffsetTableReader {
    offsets: HashMap<u32, PageOffset>,
}

impl OffsetTableReader {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("cannot read offset table {}: {}", path.display(), e),
            )
        })?;

        let mut offsets = HashMap::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return Err(Error::new(
                    ErrorKind::Parse,
                    format!("malformed offset line in {}: {}", path.display(), line),
                ));
            }

            let parse = |s: &str| -> Result<u64> {
                s.parse().map_err(|_| {
                    Error::new(
                        ErrorKind::Parse,
                        format!("bad offset field in {}: {}", path.display(), line),
                    )
                })
            };
            let docid = parse(fields[0])? as u32;
            let offset = parse(fields[1])?;
            let length = parse(fields[2])?;

            offsets.insert(
                docid,
                PageOffset {
                    docid,
                    offset,
                    length,
                },
            );
        }

        info!(path = %path.display(), pages = offsets.len(), "offset table loaded");
        Ok(OffsetTableReader { offsets })
    }

    pub fn get(&self, docid: u32) -> Option<PageOffset> {
        self.offsets.get(&docid).copied()
    }

    /// Total number of pages, the `N` of the idf formula at query time.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
