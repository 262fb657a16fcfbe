use std::sync::Arc;

use jieba_rs::Jieba;

use crate::analysis::stopwords::StopWords;
use crate::analysis::{contains_cjk, is_cjk};

/// Dictionary-based Chinese segmentation with stop-word filtering.
///
/// Input is pre-normalized so the segmenter only ever sees CJK ideographs
/// and spaces; a token survives when it contains at least one ideograph and
/// is not a stop-word.
pub struct ChineseTokenizer {
    jieba: Arc<Jieba>,
    stop_words: Arc<StopWords>,
}

impl ChineseTokenizer {
    pub fn new(jieba: Arc<Jieba>, stop_words: Arc<StopWords>) -> Self {
        ChineseTokenizer { jieba, stop_words }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = normalize(text);
        self.jieba
            .cut(&normalized, true)
            .into_iter()
            .filter(|word| contains_cjk(word) && !self.stop_words.contains(word))
            .map(str::to_string)
            .collect()
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }
}

/// Replace every codepoint outside the CJK range and outside ASCII space
/// with a single space.
fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if is_cjk(c) || c == ' ' { c } else { ' ' })
        .collect()
}
