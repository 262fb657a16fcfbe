use std::sync::Arc;

use jieba_rs::Jieba;

use crate::analysis::contains_cjk;
use crate::analysis::stopwords::StopWords;

/// Tokenization for free-text page-search queries.
///
/// The segmenter sees the query as-is (mixed script allowed); a token is
/// retained when it contains a CJK ideograph or is an ASCII-alphabetic word
/// of length >= 2, and it is not a Chinese stop-word.
pub struct QueryTokenizer {
    jieba: Arc<Jieba>,
    stop_words: Arc<StopWords>,
}

impl QueryTokenizer {
    pub fn new(jieba: Arc<Jieba>, stop_words: Arc<StopWords>) -> Self {
        QueryTokenizer { jieba, stop_words }
    }

    pub fn tokenize(&self, query: &str) -> Vec<String> {
        if query.is_empty() {
            return Vec::new();
        }

        self.jieba
            .cut(query, true)
            .into_iter()
            .filter(|word| is_search_token(word) && !self.stop_words.contains(*word))
            .map(str::to_string)
            .collect()
    }
}

fn is_search_token(word: &str) -> bool {
    if contains_cjk(word) {
        return true;
    }
    word.len() >= 2 && word.chars().all(|c| c.is_ascii_alphabetic())
}

/// Trim outer whitespace, collapse inner runs to a single space and
/// lowercase ASCII letters.
pub fn normalize_query(query: &str) -> String {
    let collapsed: Vec<&str> = query.split_whitespace().collect();
    collapsed.join(" ").to_ascii_lowercase()
}
