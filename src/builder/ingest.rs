use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::{info, warn};

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::WebPage;

/// Parses RSS feed files into cleaned page records.
///
/// Docids are assigned sequentially at ingest time; deduplication later
/// keeps the assigned ids, so the surviving sequence may have gaps.
pub struct PageIngestor {
    next_docid: u32,
    tag_pattern: Regex,
}

#[derive(Default)]
struct ItemDraft {
    title: String,
    link: String,
    encoded: String,
    content: String,
    description: String,
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Title,
    Link,
    Encoded,
    Content,
    Description,
}

impl ItemDraft {
    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Encoded => &mut self.encoded,
            Field::Content => &mut self.content,
            Field::Description => &mut self.description,
        }
    }
}

impl PageIngestor {
    pub fn new() -> Self {
        PageIngestor {
            next_docid: 1,
            tag_pattern: Regex::new("<[^>]*>").unwrap(),
        }
    }

    /// Parse every `.xml` file under `dir`, in lexicographic basename order.
    pub fn ingest_dir(&mut self, dir: &Path) -> Result<Vec<WebPage>> {
        if !dir.is_dir() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().map(|ext| ext == "xml").unwrap_or(false)
            })
            .collect();
        files.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));

        let mut pages = Vec::new();
        for path in &files {
            match self.ingest_file(path) {
                Ok(mut parsed) => pages.append(&mut parsed),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable feed"),
            }
        }

        info!(files = files.len(), pages = pages.len(), "feeds ingested");
        Ok(pages)
    }

    pub fn ingest_file(&mut self, path: &Path) -> Result<Vec<WebPage>> {
        let xml = fs::read_to_string(path)?;
        Ok(self.parse_rss(&xml))
    }

    /// Walk `rss > channel > item` nodes, extracting title, link and the
    /// first non-empty of content:encoded | content | description.
    pub fn parse_rss(&mut self, xml: &str) -> Vec<WebPage> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut pages = Vec::new();
        let mut draft: Option<ItemDraft> = None;
        let mut field: Option<Field> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = e.name();
                    match name.as_ref() {
                        b"item" => {
                            draft = Some(ItemDraft::default());
                            field = None;
                        }
                        b"title" => field = Some(Field::Title),
                        b"link" => field = Some(Field::Link),
                        b"content:encoded" => field = Some(Field::Encoded),
                        b"content" => field = Some(Field::Content),
                        b"description" => field = Some(Field::Description),
                        _ => field = None,
                    }
                }
                Ok(Event::Text(t)) => {
                    if let (Some(draft), Some(field)) = (draft.as_mut(), field) {
                        let text = t
                            .unescape()
                            .map(|s| s.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(t.as_ref()).into_owned());
                        draft.slot(field).push_str(&text);
                    }
                }
                Ok(Event::CData(t)) => {
                    if let (Some(draft), Some(field)) = (draft.as_mut(), field) {
                        let text = String::from_utf8_lossy(t.as_ref());
                        draft.slot(field).push_str(&text);
                    }
                }
                Ok(Event::End(e)) => {
                    if e.name().as_ref() == b"item" {
                        if let Some(item) = draft.take() {
                            if let Some(page) = self.finish_item(item) {
                                pages.push(page);
                            }
                        }
                    }
                    field = None;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    warn!(error = %e, "malformed feed, keeping items parsed so far");
                    break;
                }
                _ => {}
            }
        }

        pages
    }

    /// Items whose cleaned content is empty are discarded and consume no
    /// docid.
    fn finish_item(&mut self, item: ItemDraft) -> Option<WebPage> {
        let raw_content = if !item.encoded.is_empty() {
            &item.encoded
        } else if !item.content.is_empty() {
            &item.content
        } else {
            &item.description
        };

        let content = self.clean_text(raw_content);
        if content.is_empty() {
            return None;
        }

        let docid = self.next_docid;
        self.next_docid += 1;
        Some(WebPage {
            docid,
            link: item.link.trim().to_string(),
            title: self.clean_text(&item.title),
            content,
        })
    }

    /// Strip a single leading CDATA wrapper, remove all `<...>` tags,
    /// collapse whitespace runs and trim.
    pub fn clean_text(&self, raw: &str) -> String {
        let mut text = raw.to_string();

        if let Some(start) = text.find("<![CDATA[") {
            text.replace_range(start..start + 9, "");
            if let Some(end) = text.find("]]>") {
                text.replace_range(end..end + 3, "");
            }
        }

        let stripped = self.tag_pattern.replace_all(&text, " ");
        stripped.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

impl Default for PageIngestor {
    fn default() -> Self {
        PageIngestor::new()
    }
}

/// Serialize pages to the pages file and record each record's byte span in
/// the offsets file.
pub fn write_pages(pages: &[WebPage], pages_path: &Path, offsets_path: &Path) -> Result<()> {
    let mut pages_out = BufWriter::new(File::create(pages_path)?);
    let mut offsets_out = BufWriter::new(File::create(offsets_path)?);

    let mut offset = 0u64;
    for page in pages {
        let record = format!(
            "<doc>\n  <docid>{}</docid>\n  <link>{}</link>\n  <title>{}</title>\n  <content>{}</content>\n</doc>\n",
            page.docid, page.link, page.title, page.content
        );
        pages_out.write_all(record.as_bytes())?;
        writeln!(offsets_out, "{} {} {}", page.docid, offset, record.len())?;
        offset += record.len() as u64;
    }

    pages_out.flush()?;
    offsets_out.flush()?;
    info!(pages = pages.len(), path = %pages_path.display(), "pages file written");
    Ok(())
}
