use std::sync::Arc;

use crate::analysis::stopwords::StopWords;

/// ASCII English tokenization: lowercase, punctuation to spaces, whitespace
/// split, then length and stop-word filtering.
pub struct EnglishTokenizer {
    stop_words: Arc<StopWords>,
}

impl EnglishTokenizer {
    pub fn new(stop_words: Arc<StopWords>) -> Self {
        EnglishTokenizer { stop_words }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .chars()
            .map(|c| {
                if c.is_ascii_alphabetic() {
                    c.to_ascii_lowercase()
                } else {
                    ' '
                }
            })
            .collect();

        cleaned
            .split_ascii_whitespace()
            .filter(|word| is_valid_word(word) && !self.stop_words.contains(word))
            .map(str::to_string)
            .collect()
    }
}

fn is_valid_word(word: &str) -> bool {
    word.len() >= 2 && word.chars().all(|c| c.is_ascii_alphabetic())
}
