use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use jieba_rs::Jieba;
use tracing::{debug, info};

use crate::analysis::chinese::ChineseTokenizer;
use crate::analysis::english::EnglishTokenizer;
use crate::analysis::is_cjk;
use crate::analysis::stopwords::StopWords;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::Language;

enum Segmenter {
    Chinese(ChineseTokenizer),
    English(EnglishTokenizer),
}

impl Segmenter {
    fn tokenize(&self, line: &str) -> Vec<String> {
        match self {
            Segmenter::Chinese(t) => t.tokenize(line),
            Segmenter::English(t) => t.tokenize(line),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LexiconStats {
    pub files_processed: usize,
    pub tokens_seen: u64,
    pub unique_words: usize,
    pub characters_indexed: usize,
}

/// Accumulates word frequencies over a corpus directory and writes the
/// sorted dictionary plus the character/letter index.
///
/// The index side is the only language-specific part: Chinese words are
/// indexed by their CJK characters, English words by their ASCII letters.
pub struct LexiconBuilder {
    lang: Language,
    segmenter: Segmenter,
    word_frequency: HashMap<String, u64>,
    stats: LexiconStats,
}

impl LexiconBuilder {
    pub fn chinese(jieba: Arc<Jieba>, stop_words: Arc<StopWords>) -> Self {
        LexiconBuilder {
            lang: Language::Chinese,
            segmenter: Segmenter::Chinese(ChineseTokenizer::new(jieba, stop_words)),
            word_frequency: HashMap::new(),
            stats: LexiconStats::default(),
        }
    }

    pub fn english(stop_words: Arc<StopWords>) -> Self {
        LexiconBuilder {
            lang: Language::English,
            segmenter: Segmenter::English(EnglishTokenizer::new(stop_words)),
            word_frequency: HashMap::new(),
            stats: LexiconStats::default(),
        }
    }

    /// Process every `.txt` file under `dir`, in lexicographic basename
    /// order so the output bytes do not depend on filesystem iteration.
    pub fn process_dir(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("{} is not a directory", dir.display()),
            ));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file() && path.extension().map(|ext| ext == "txt").unwrap_or(false)
            })
            .collect();
        files.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));

        if files.is_empty() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("no .txt files under {}", dir.display()),
            ));
        }

        info!(lang = self.lang.as_str(), dir = %dir.display(), files = files.len(), "building lexicon");
        for path in files {
            self.process_file(&path)?;
        }
        Ok(())
    }

    pub fn process_file(&mut self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "tokenizing corpus file");
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            for word in self.segmenter.tokenize(&line) {
                self.stats.tokens_seen += 1;
                *self.word_frequency.entry(word).or_insert(0) += 1;
            }
        }
        self.stats.files_processed += 1;
        Ok(())
    }

    /// Write the dictionary and character/letter index files. Entries are
    /// sorted by Unicode codepoint of the word; index rows by codepoint of
    /// the character.
    pub fn write_artifacts(&mut self, dict_path: &Path, index_path: &Path) -> Result<()> {
        if self.word_frequency.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "no words accumulated; nothing to write",
            ));
        }

        let mut sorted: Vec<(&String, &u64)> = self.word_frequency.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let mut dict = BufWriter::new(File::create(dict_path)?);
        for (word, frequency) in &sorted {
            writeln!(dict, "{} {}", word, frequency)?;
        }
        dict.flush()?;

        // 1-based line numbers follow dictionary order.
        let mut char_postings: HashMap<char, Vec<u32>> = HashMap::new();
        for (line, (word, _)) in sorted.iter().enumerate() {
            let mut seen = HashSet::new();
            for c in indexable_chars(self.lang, word) {
                if seen.insert(c) {
                    char_postings.entry(c).or_default().push(line as u32 + 1);
                }
            }
        }

        let mut chars: Vec<char> = char_postings.keys().copied().collect();
        chars.sort_unstable();

        let mut index = BufWriter::new(File::create(index_path)?);
        for c in &chars {
            write!(index, "{}", c)?;
            for line in &char_postings[c] {
                write!(index, " {}", line)?;
            }
            writeln!(index)?;
        }
        index.flush()?;

        self.stats.unique_words = sorted.len();
        self.stats.characters_indexed = chars.len();
        info!(
            lang = self.lang.as_str(),
            words = self.stats.unique_words,
            characters = self.stats.characters_indexed,
            "lexicon artifacts written"
        );
        Ok(())
    }

    pub fn stats(&self) -> &LexiconStats {
        &self.stats
    }
}

fn indexable_chars(lang: Language, word: &str) -> Vec<char> {
    match lang {
        Language::Chinese => word.chars().filter(|c| is_cjk(*c)).collect(),
        Language::English => word
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::char_index::CharIndexReader;
    use crate::reader::dictionary::DictionaryReader;

    fn write_corpus(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn english_dictionary_and_letter_index() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path(), "b.txt", "banana apple\n");
        write_corpus(dir.path(), "a.txt", "apple cherry apple\n");

        let mut builder = LexiconBuilder::english(Arc::new(StopWords::empty()));
        builder.process_dir(dir.path()).unwrap();

        let dict_path = dir.path().join("dict_en.dat");
        let index_path = dir.path().join("index_en.dat");
        builder.write_artifacts(&dict_path, &index_path).unwrap();

        let dict = DictionaryReader::load(&dict_path).unwrap();
        // sorted: apple banana cherry
        assert_eq!(dict.word_at(1), Some("apple"));
        assert_eq!(dict.word_at(2), Some("banana"));
        assert_eq!(dict.word_at(3), Some("cherry"));
        assert_eq!(dict.frequency("apple"), 3);

        let index = CharIndexReader::load(&index_path).unwrap();
        // 'a' occurs in apple (1) and banana (2), once per word
        assert_eq!(index.line_numbers('a'), &[1, 2]);
        // 'c' occurs only in cherry (3)
        assert_eq!(index.line_numbers('c'), &[3]);
    }

    #[test]
    fn deterministic_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path(), "x.txt", "delta echo\n");
        write_corpus(dir.path(), "y.txt", "echo foxtrot\n");

        let build = || {
            let mut builder = LexiconBuilder::english(Arc::new(StopWords::empty()));
            builder.process_dir(dir.path()).unwrap();
            let d = dir.path().join("d.dat");
            let i = dir.path().join("i.dat");
            builder.write_artifacts(&d, &i).unwrap();
            (fs::read(d).unwrap(), fs::read(i).unwrap())
        };

        assert_eq!(build(), build());
    }
}
