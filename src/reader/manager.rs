use std::path::Path;

use tracing::info;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{Language, WebPage};
use crate::reader::char_index::CharIndexReader;
use crate::reader::dictionary::DictionaryReader;
use crate::reader::inverted::InvertedIndexReader;
use crate::reader::offsets::OffsetTableReader;
use crate::store::layout::ArtifactLayout;
use crate::store::page_store::PageStore;

/// All serving-time artifacts, loaded once at startup.
///
/// Everything here is immutable after `load` and may be queried from any
/// worker thread without external locks; only `page` touches the filesystem
/// (a per-call open/read of the pages file).
pub struct DataReaders {
    pub cn_dictionary: DictionaryReader,
    pub en_dictionary: DictionaryReader,
    pub cn_char_index: CharIndexReader,
    pub en_char_index: CharIndexReader,
    pub offsets: OffsetTableReader,
    pub inverted: InvertedIndexReader,
    pages: PageStore,
}

impl DataReaders {
    pub fn load(data_dir: &Path) -> Result<Self> {
        let layout = ArtifactLayout::new(data_dir);
        info!(data_dir = %data_dir.display(), "loading search artifacts");

        let readers = DataReaders {
            cn_dictionary: DictionaryReader::load(&layout.dictionary_path(Language::Chinese))?,
            en_dictionary: DictionaryReader::load(&layout.dictionary_path(Language::English))?,
            cn_char_index: CharIndexReader::load(&layout.char_index_path(Language::Chinese))?,
            en_char_index: CharIndexReader::load(&layout.char_index_path(Language::English))?,
            offsets: OffsetTableReader::load(&layout.offsets_path())?,
            inverted: InvertedIndexReader::load(&layout.inverted_index_path())?,
            pages: PageStore::new(layout.webpages_path()),
        };

        info!(
            cn_words = readers.cn_dictionary.len(),
            en_words = readers.en_dictionary.len(),
            pages = readers.offsets.len(),
            terms = readers.inverted.term_count(),
            "search artifacts ready"
        );
        Ok(readers)
    }

    pub fn dictionary(&self, lang: Language) -> &DictionaryReader {
        match lang {
            Language::Chinese => &self.cn_dictionary,
            Language::English => &self.en_dictionary,
        }
    }

    pub fn char_index(&self, lang: Language) -> &CharIndexReader {
        match lang {
            Language::Chinese => &self.cn_char_index,
            Language::English => &self.en_char_index,
        }
    }

    /// Frequency of `word` in the given lexicon, 0 when absent.
    pub fn frequency(&self, lang: Language, word: &str) -> u64 {
        self.dictionary(lang).frequency(word)
    }

    /// Index postings for `character` in the given language.
    pub fn line_numbers(&self, lang: Language, character: char) -> &[u32] {
        self.char_index(lang).line_numbers(character)
    }

    /// Word at a 1-based lexicon line, `None` when out of range.
    pub fn word_at(&self, lang: Language, line: usize) -> Option<&str> {
        self.dictionary(lang).word_at(line)
    }

    /// Fetch one page by docid from the pages file.
    pub fn page(&self, docid: u32) -> Result<WebPage> {
        let span = self.offsets.get(docid).ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("unknown docid {}", docid))
        })?;
        self.pages.fetch(span)
    }
}
