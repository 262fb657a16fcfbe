use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use tracing::info;

use crate::analysis::chinese::ChineseTokenizer;
use crate::core::types::WebPage;

/// 64-bit SimHash fingerprints over a page's top-K tokens by frequency.
///
/// Similar pages produce fingerprints within a small Hamming distance; the
/// token hash is the deterministic zero-keyed SipHash of the standard
/// library, so fingerprints are stable across runs.
pub struct SimHasher {
    top_k: usize,
}

impl SimHasher {
    pub fn new(top_k: usize) -> Self {
        SimHasher { top_k }
    }

    pub fn fingerprint(&self, tokens: &[String]) -> u64 {
        let mut frequency: HashMap<&str, i64> = HashMap::new();
        for token in tokens {
            *frequency.entry(token).or_insert(0) += 1;
        }

        // Top-K selection ordered by (frequency desc, token asc) so the
        // fingerprint does not depend on hash-map iteration order.
        let mut weighted: Vec<(&str, i64)> = frequency.into_iter().collect();
        weighted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        weighted.truncate(self.top_k);

        let mut votes = [0i64; 64];
        for (token, weight) in weighted {
            let hash = hash64(token);
            for (bit, vote) in votes.iter_mut().enumerate() {
                if hash >> bit & 1 == 1 {
                    *vote += weight;
                } else {
                    *vote -= weight;
                }
            }
        }

        let mut fingerprint = 0u64;
        for (bit, vote) in votes.iter().enumerate() {
            if *vote > 0 {
                fingerprint |= 1 << bit;
            }
        }
        fingerprint
    }
}

pub fn hamming_distance(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// Near-duplicate elimination in document order: a page is kept when no
/// already-kept fingerprint is within `threshold` Hamming distance.
pub fn deduplicate(
    pages: Vec<WebPage>,
    tokenizer: &ChineseTokenizer,
    hasher: &SimHasher,
    threshold: u32,
) -> Vec<WebPage> {
    let total = pages.len();
    let mut kept_fingerprints: Vec<u64> = Vec::new();
    let mut unique = Vec::new();

    for page in pages {
        let tokens = tokenizer.tokenize(&page.content);
        let fingerprint = hasher.fingerprint(&tokens);

        let duplicate = kept_fingerprints
            .iter()
            .any(|&kept| hamming_distance(fingerprint, kept) <= threshold);
        if !duplicate {
            kept_fingerprints.push(fingerprint);
            unique.push(page);
        }
    }

    info!(before = total, after = unique.len(), "near-duplicate elimination done");
    unique
}

fn hash64(token: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    token.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::stopwords::StopWords;
    use jieba_rs::Jieba;
    use std::sync::Arc;

    fn tokenizer() -> ChineseTokenizer {
        ChineseTokenizer::new(Arc::new(Jieba::new()), Arc::new(StopWords::empty()))
    }

    fn page(docid: u32, content: &str) -> WebPage {
        WebPage {
            docid,
            link: format!("https://example.cn/{}", docid),
            title: format!("页面{}", docid),
            content: content.to_string(),
        }
    }

    #[test]
    fn identical_pages_have_zero_distance() {
        let hasher = SimHasher::new(100);
        let tok = tokenizer();
        let a = hasher.fingerprint(&tok.tokenize("北京 是 中国 的 首都"));
        let b = hasher.fingerprint(&tok.tokenize("北京 是 中国 的 首都"));
        assert_eq!(hamming_distance(a, b), 0);
    }

    #[test]
    fn unrelated_pages_are_far_apart() {
        let hasher = SimHasher::new(100);
        let tok = tokenizer();
        let a = hasher.fingerprint(&tok.tokenize("北京 中国 首都 天安门 故宫 长城"));
        let b = hasher.fingerprint(&tok.tokenize("股票 基金 投资 理财 证券 市场"));
        assert!(hamming_distance(a, b) > 3);
    }

    #[test]
    fn dedup_keeps_earlier_page() {
        let hasher = SimHasher::new(100);
        let tok = tokenizer();
        let pages = vec![
            page(1, "北京 是 中国 的 首都"),
            page(2, "北京 是 中国 的 首都"),
            page(3, "股票 基金 投资 理财 证券 市场"),
        ];

        let unique = deduplicate(pages, &tok, &hasher, 3);
        let ids: Vec<u32> = unique.iter().map(|p| p.docid).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let hasher = SimHasher::new(10);
        let tokens: Vec<String> = ["中国", "北京", "中国"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(hasher.fingerprint(&tokens), hasher.fingerprint(&tokens));
    }
}
