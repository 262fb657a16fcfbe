use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{contains_cjk, is_cjk};
use crate::cache::lru::SharedCache;
use crate::core::types::Language;
use crate::reader::manager::DataReaders;

/// Upper bound on the number of candidates one request may ask for.
pub const MAX_RECOMMEND_K: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub word: String,
    #[serde(rename = "editDistance")]
    pub edit_distance: usize,
    pub frequency: u64,
}

/// Keyword recommendation: candidate words drawn from the character/letter
/// indexes, ranked by edit distance, frequency and lexicographic order.
pub struct KeywordRecommender {
    readers: Arc<DataReaders>,
    max_edit_distance: usize,
    recommend_cache: SharedCache<(String, usize), Vec<Candidate>>,
    edit_distance_cache: SharedCache<(String, String), usize>,
}

impl KeywordRecommender {
    pub fn new(
        readers: Arc<DataReaders>,
        max_edit_distance: usize,
        recommend_cache_size: usize,
        edit_distance_cache_size: usize,
    ) -> Self {
        KeywordRecommender {
            readers,
            max_edit_distance,
            recommend_cache: SharedCache::new(recommend_cache_size),
            edit_distance_cache: SharedCache::new(edit_distance_cache_size),
        }
    }

    pub fn recommend(&self, query: &str, k: usize) -> Vec<Candidate> {
        if query.is_empty() || k == 0 {
            return Vec::new();
        }
        let k = k.min(MAX_RECOMMEND_K);

        let cache_key = (query.to_string(), k);
        if let Some(cached) = self.recommend_cache.get(&cache_key) {
            debug!(query, k, "recommendation served from cache");
            return cached;
        }

        let mut candidates: Vec<Candidate> = self
            .candidate_words(query)
            .into_iter()
            .filter_map(|word| {
                let distance = self.edit_distance(query, &word);
                if distance > self.max_edit_distance {
                    return None;
                }
                Some(Candidate {
                    frequency: self.word_frequency(&word),
                    word,
                    edit_distance: distance,
                })
            })
            .collect();

        candidates.sort_by(|a, b| match a.edit_distance.cmp(&b.edit_distance) {
            Ordering::Equal => match b.frequency.cmp(&a.frequency) {
                Ordering::Equal => a.word.cmp(&b.word),
                other => other,
            },
            other => other,
        });
        candidates.truncate(k);

        self.recommend_cache.put(cache_key, candidates.clone());
        candidates
    }

    /// Union the index postings of every query character, then resolve the
    /// line numbers in the lexicon of the query's language.
    fn candidate_words(&self, query: &str) -> Vec<String> {
        let lang = if contains_cjk(query) {
            Language::Chinese
        } else {
            Language::English
        };

        // BTreeSet keeps the union ordered, so candidate enumeration is
        // deterministic.
        let mut lines: BTreeSet<u32> = BTreeSet::new();
        for c in query.chars() {
            if is_cjk(c) {
                lines.extend(self.readers.line_numbers(Language::Chinese, c));
            } else if c.is_ascii_alphabetic() {
                let letter = c.to_ascii_lowercase();
                lines.extend(self.readers.line_numbers(Language::English, letter));
            }
        }

        let mut words = BTreeSet::new();
        for line in lines {
            if let Some(word) = self.readers.word_at(lang, line as usize) {
                words.insert(word.to_string());
            }
        }
        words.into_iter().collect()
    }

    fn word_frequency(&self, word: &str) -> u64 {
        let frequency = self.readers.frequency(Language::Chinese, word);
        if frequency > 0 {
            frequency
        } else {
            self.readers.frequency(Language::English, word)
        }
    }

    /// Levenshtein distance over character sequences, memoized under an
    /// unordered word pair.
    pub fn edit_distance(&self, a: &str, b: &str) -> usize {
        let key = (a.to_string(), b.to_string());
        if let Some(distance) = self.edit_distance_cache.get(&key) {
            return distance;
        }
        let reversed = (b.to_string(), a.to_string());
        if let Some(distance) = self.edit_distance_cache.get(&reversed) {
            return distance;
        }

        let distance = levenshtein(a, b);
        self.edit_distance_cache.put(key, distance);
        distance
    }

    pub fn cache_stats(&self) -> (crate::cache::lru::CacheStats, crate::cache::lru::CacheStats) {
        (
            self.recommend_cache.stats(),
            self.edit_distance_cache.stats(),
        )
    }
}

/// Two-row dynamic program over character arrays; insert, delete and
/// substitute all cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::layout::ArtifactLayout;
    use std::fs;
    use std::path::Path;

    fn write_artifacts(dir: &Path) {
        // Chinese lexicon: 中国 100 / 中央 50 / 忠告 30 (already sorted);
        // 中 deliberately indexes all three lines so one query surfaces the
        // full ranking
        fs::write(dir.join("dict_cn.dat"), "中国 100\n中央 50\n忠告 30\n").unwrap();
        fs::write(dir.join("index_cn.dat"), "中 1 2 3\n国 1\n央 2\n告 3\n忠 3\n").unwrap();
        fs::write(dir.join("dict_en.dat"), "hello 10\nhelp 5\n").unwrap();
        fs::write(dir.join("index_en.dat"), "e 1 2\nh 1 2\nl 1 2\no 1\np 2\n").unwrap();
        fs::write(dir.join("offsets.dat"), "").unwrap();
        fs::write(dir.join("inverted_index.dat"), "").unwrap();
        fs::write(dir.join("webpages.dat"), "").unwrap();
    }

    fn recommender(dir: &Path) -> KeywordRecommender {
        write_artifacts(dir);
        let layout = ArtifactLayout::new(dir);
        let readers = Arc::new(DataReaders::load(&layout.base_dir).unwrap());
        KeywordRecommender::new(readers, 3, 16, 64)
    }

    #[test]
    fn levenshtein_properties() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", "abc"), 0);
        assert_eq!(levenshtein("abc", "abd"), 1);
        assert_eq!(levenshtein("中国", "中央"), 1);
        // symmetry
        assert_eq!(levenshtein("kitten", "sitting"), levenshtein("sitting", "kitten"));
        // triangle inequality on a sample
        let (x, y, z) = ("中国", "中央", "忠告");
        assert!(levenshtein(x, z) <= levenshtein(x, y) + levenshtein(y, z));
    }

    #[test]
    fn ranked_by_distance_frequency_word() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recommender(dir.path());

        let got = rec.recommend("中国", 3);
        let words: Vec<&str> = got.iter().map(|c| c.word.as_str()).collect();
        assert_eq!(words, vec!["中国", "中央", "忠告"]);
        assert_eq!(got[0].edit_distance, 0);
        assert_eq!(got[0].frequency, 100);
        assert_eq!(got[1].edit_distance, 1);
        assert_eq!(got[2].edit_distance, 2);
    }

    #[test]
    fn monotonic_in_k() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recommender(dir.path());

        let three = rec.recommend("中国", 3);
        let one = rec.recommend("中国", 1);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0], three[0]);
    }

    #[test]
    fn empty_query_and_zero_k() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recommender(dir.path());
        assert!(rec.recommend("", 5).is_empty());
        assert!(rec.recommend("中国", 0).is_empty());
    }

    #[test]
    fn english_candidates_from_letter_index() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recommender(dir.path());

        let got = rec.recommend("helo", 5);
        let words: Vec<&str> = got.iter().map(|c| c.word.as_str()).collect();
        // both are distance 1; hello wins on frequency
        assert_eq!(words, vec!["hello", "help"]);
    }

    #[test]
    fn second_lookup_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recommender(dir.path());

        let first = rec.recommend("中国", 2);
        let second = rec.recommend("中国", 2);
        assert_eq!(first, second);
        assert!(rec.cache_stats().0.hits >= 1);
    }
}
