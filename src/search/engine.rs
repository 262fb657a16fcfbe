use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::analysis::query::{normalize_query, QueryTokenizer};
use crate::cache::lru::SharedCache;
use crate::reader::manager::DataReaders;
use crate::search::summary;

/// Upper bound on the number of results one request may ask for.
pub const MAX_SEARCH_TOP_N: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub docid: u32,
    pub title: String,
    pub url: String,
    pub summary: String,
    pub score: f64,
}

/// Vector-space page search: tokenize the query, intersect posting lists,
/// score candidates by cosine similarity and materialize summaries.
pub struct WebSearchEngine {
    readers: Arc<DataReaders>,
    tokenizer: QueryTokenizer,
    max_summary_length: usize,
    search_cache: SharedCache<(String, usize), Vec<SearchResult>>,
}

impl WebSearchEngine {
    pub fn new(
        readers: Arc<DataReaders>,
        tokenizer: QueryTokenizer,
        max_summary_length: usize,
        search_cache_size: usize,
    ) -> Self {
        WebSearchEngine {
            readers,
            tokenizer,
            max_summary_length,
            search_cache: SharedCache::new(search_cache_size),
        }
    }

    pub fn search(&self, query: &str, top_n: usize) -> Vec<SearchResult> {
        if query.is_empty() || top_n == 0 {
            return Vec::new();
        }
        let top_n = top_n.min(MAX_SEARCH_TOP_N);

        let cache_key = (query.to_string(), top_n);
        if let Some(cached) = self.search_cache.get(&cache_key) {
            debug!(query, top_n, "search served from cache");
            return cached;
        }

        let normalized = normalize_query(query);
        let terms = self.tokenizer.tokenize(&normalized);
        debug!(query, ?terms, "query tokenized");
        if terms.is_empty() {
            return Vec::new();
        }

        let results = self.perform_search(&terms, top_n);
        if !results.is_empty() {
            self.search_cache.put(cache_key, results.clone());
        }
        results
    }

    fn perform_search(&self, terms: &[String], top_n: usize) -> Vec<SearchResult> {
        let candidates = self.intersect_documents(terms);
        if candidates.is_empty() {
            return Vec::new();
        }
        debug!(candidates = candidates.len(), "intersection complete");

        let query_vector = self.query_vector(terms);
        if query_vector.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(u32, f64)> = candidates
            .into_iter()
            .filter_map(|docid| {
                let score = self.cosine_similarity(docid, terms, &query_vector);
                if score > 0.0 {
                    Some((docid, score))
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(top_n);

        scored
            .into_iter()
            .filter_map(|(docid, score)| match self.readers.page(docid) {
                Ok(page) => {
                    let snippet =
                        summary::generate(&page.content, terms, self.max_summary_length);
                    Some(SearchResult {
                        docid,
                        title: summary::sanitize(&page.title),
                        url: summary::sanitize(&page.link),
                        summary: snippet,
                        score,
                    })
                }
                Err(e) => {
                    warn!(docid, error = %e, "dropping result, page fetch failed");
                    None
                }
            })
            .collect()
    }

    /// Documents containing every query term. Any term missing from the
    /// index empties the intersection.
    fn intersect_documents(&self, terms: &[String]) -> Vec<u32> {
        let Some(first) = terms.first() else {
            return Vec::new();
        };
        if !self.readers.inverted.has_term(first) {
            return Vec::new();
        }

        let mut result: HashSet<u32> = self
            .readers
            .inverted
            .postings(first)
            .iter()
            .map(|(docid, _)| *docid)
            .collect();

        for term in &terms[1..] {
            if !self.readers.inverted.has_term(term) {
                return Vec::new();
            }
            let current: HashSet<u32> = self
                .readers
                .inverted
                .postings(term)
                .iter()
                .map(|(docid, _)| *docid)
                .collect();
            result.retain(|docid| current.contains(docid));
            if result.is_empty() {
                return Vec::new();
            }
        }

        let mut docids: Vec<u32> = result.into_iter().collect();
        docids.sort_unstable();
        docids
    }

    /// L2-normalized TF-IDF vector of the query, restricted to terms
    /// present in the index.
    fn query_vector(&self, terms: &[String]) -> HashMap<String, f64> {
        let total_docs = self.readers.offsets.len() as f64;

        let mut term_frequency: HashMap<&str, usize> = HashMap::new();
        for term in terms {
            *term_frequency.entry(term).or_insert(0) += 1;
        }

        let mut vector = HashMap::new();
        let mut norm_squared = 0.0f64;
        for (term, tf) in term_frequency {
            let postings = self.readers.inverted.postings(term);
            if postings.is_empty() {
                continue;
            }
            let df = postings.len() as f64;
            let idf = (total_docs / (df + 1.0)).log2();
            let weight = tf as f64 * idf;
            norm_squared += weight * weight;
            vector.insert(term.to_string(), weight);
        }

        if norm_squared > 0.0 {
            let norm = norm_squared.sqrt();
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }

    /// Both vectors are L2-normalized, so the cosine is their dot product.
    fn cosine_similarity(
        &self,
        docid: u32,
        terms: &[String],
        query_vector: &HashMap<String, f64>,
    ) -> f64 {
        let document_vector = self.document_vector(docid, terms);
        if document_vector.is_empty() {
            return 0.0;
        }

        query_vector
            .iter()
            .filter_map(|(term, weight)| document_vector.get(term).map(|dw| weight * dw))
            .sum()
    }

    /// Document vector restricted to the query terms, using the normalized
    /// weights stored in the inverted index.
    fn document_vector(&self, docid: u32, terms: &[String]) -> HashMap<String, f64> {
        let mut vector = HashMap::new();
        for term in terms {
            for (posted_docid, weight) in self.readers.inverted.postings(term) {
                if *posted_docid == docid {
                    vector.insert(term.clone(), *weight);
                    break;
                }
            }
        }
        vector
    }

    pub fn cache_stats(&self) -> crate::cache::lru::CacheStats {
        self.search_cache.stats()
    }
}
