use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{PageOffset, WebPage};

/// Random-access reads of serialized pages from the pages file.
///
/// The file is opened per call and closed before returning, so the store can
/// be shared across worker threads without holding a file handle.
pub struct PageStore {
    path: PathBuf,
}

impl PageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PageStore { path: path.into() }
    }

    /// Read exactly `span.length` bytes at `span.offset` and parse the
    /// embedded `<doc>` record.
    pub fn fetch(&self, span: PageOffset) -> Result<WebPage> {
        let mut file = File::open(&self.path).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("cannot open pages file {}: {}", self.path.display(), e),
            )
        })?;
        file.seek(SeekFrom::Start(span.offset))?;

        let mut raw = vec![0u8; span.length as usize];
        file.read_exact(&mut raw).map_err(|e| {
            Error::new(
                ErrorKind::Io,
                format!("short read for docid {}: {}", span.docid, e),
            )
        })?;

        let text = String::from_utf8_lossy(&raw);
        parse_record(&text, span.docid)
    }
}

/// Extract one page from its `<doc>` block. The content was tag-stripped at
/// ingest, so plain string search between tag pairs is sufficient.
fn parse_record(text: &str, expected_docid: u32) -> Result<WebPage> {
    let docid_text = extract_tag(text, "docid").ok_or_else(|| {
        Error::new(
            ErrorKind::NotFound,
            format!("page record for docid {} has no <docid> tag", expected_docid),
        )
    })?;
    let docid: u32 = docid_text.trim().parse().map_err(|_| {
        Error::new(
            ErrorKind::Parse,
            format!("unparsable docid in page record: {}", docid_text),
        )
    })?;
    if docid != expected_docid {
        return Err(Error::new(
            ErrorKind::NotFound,
            format!(
                "page record docid mismatch: expected {}, found {}",
                expected_docid, docid
            ),
        ));
    }

    Ok(WebPage {
        docid,
        link: extract_tag(text, "link").unwrap_or("").trim().to_string(),
        title: extract_tag(text, "title").unwrap_or("").trim().to_string(),
        content: extract_tag(text, "content").unwrap_or("").trim().to_string(),
    })
}

fn extract_tag<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = text.find(&open)? + open.len();
    let end = text[start..].find(&close)? + start;
    Some(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RECORD: &str = "<doc>\n  <docid>7</docid>\n  <link>https://example.cn/a</link>\n  <title>示例标题</title>\n  <content>北京 是 中国 的 首都</content>\n</doc>\n";

    #[test]
    fn fetch_parses_record() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "junk-prefix-").unwrap();
        let offset = 12u64;
        write!(file, "{}", RECORD).unwrap();
        file.flush().unwrap();

        let store = PageStore::new(file.path());
        let page = store
            .fetch(PageOffset {
                docid: 7,
                offset,
                length: RECORD.len() as u64,
            })
            .unwrap();

        assert_eq!(page.docid, 7);
        assert_eq!(page.link, "https://example.cn/a");
        assert_eq!(page.title, "示例标题");
        assert_eq!(page.content, "北京 是 中国 的 首都");
    }

    #[test]
    fn docid_mismatch_is_not_found() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", RECORD).unwrap();
        file.flush().unwrap();

        let store = PageStore::new(file.path());
        let err = store
            .fetch(PageOffset {
                docid: 9,
                offset: 0,
                length: RECORD.len() as u64,
            })
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
