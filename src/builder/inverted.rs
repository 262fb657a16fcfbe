use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::analysis::chinese::ChineseTokenizer;
use crate::core::error::Result;
use crate::core::types::WebPage;

/// Builds the term-sorted inverted index with L2-normalized TF-IDF weights
/// over the deduplicated pages.
///
/// Only the Chinese tokenizer feeds the index; English artifacts are built
/// separately and are not part of page search.
pub struct InvertedIndexBuilder {
    weights: BTreeMap<String, Vec<(u32, f64)>>,
    documents: usize,
}

impl InvertedIndexBuilder {
    pub fn build(pages: &[WebPage], tokenizer: &ChineseTokenizer) -> Self {
        // term -> docid -> tf
        let mut term_frequency: HashMap<String, HashMap<u32, u64>> = HashMap::new();
        // term -> number of documents containing it
        let mut document_frequency: HashMap<String, u64> = HashMap::new();

        for page in pages {
            let mut seen_in_doc: HashSet<String> = HashSet::new();
            for token in tokenizer.tokenize(&page.content) {
                if seen_in_doc.insert(token.clone()) {
                    *document_frequency.entry(token.clone()).or_insert(0) += 1;
                }
                let per_doc = term_frequency.entry(token).or_default();
                *per_doc.entry(page.docid).or_insert(0) += 1;
            }
        }

        let total_docs = pages.len();
        let mut raw: HashMap<&str, Vec<(u32, f64)>> = HashMap::new();
        let mut doc_norms: HashMap<u32, f64> = HashMap::new();

        for (term, per_doc) in &term_frequency {
            let df = document_frequency[term.as_str()];
            let idf = (total_docs as f64 / (df as f64 + 1.0)).log2();

            let mut postings = Vec::with_capacity(per_doc.len());
            for (&docid, &tf) in per_doc {
                let weight = tf as f64 * idf;
                *doc_norms.entry(docid).or_insert(0.0) += weight * weight;
                postings.push((docid, weight));
            }
            raw.insert(term, postings);
        }

        let mut weights = BTreeMap::new();
        for (term, postings) in raw {
            let mut normalized: Vec<(u32, f64)> = postings
                .into_iter()
                .map(|(docid, weight)| {
                    let norm = doc_norms[&docid].sqrt();
                    if norm > 0.0 {
                        (docid, weight / norm)
                    } else {
                        (docid, weight)
                    }
                })
                .filter(|(_, weight)| *weight != 0.0)
                .collect();
            normalized.sort_by_key(|(docid, _)| *docid);

            if !normalized.is_empty() {
                weights.insert(term.to_string(), normalized);
            }
        }

        info!(
            documents = total_docs,
            terms = weights.len(),
            "inverted index computed"
        );
        InvertedIndexBuilder {
            weights,
            documents: total_docs,
        }
    }

    /// Emit `<term> (<docid> <weight>)*` lines, terms in Unicode order,
    /// weights with 6-digit fixed precision.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        for (term, postings) in &self.weights {
            write!(out, "{}", term)?;
            for (docid, weight) in postings {
                write!(out, " {} {:.6}", docid, weight)?;
            }
            writeln!(out)?;
        }
        out.flush()?;

        info!(path = %path.display(), terms = self.weights.len(), "inverted index written");
        Ok(())
    }

    pub fn term_count(&self) -> usize {
        self.weights.len()
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    pub fn postings(&self, term: &str) -> Option<&[(u32, f64)]> {
        self.weights.get(term).map(Vec::as_slice)
    }
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
            link: String::new(),
            title: String::new(),
            content: content.to_string(),
        }
    }

    #[test]
    fn document_vectors_are_unit_length() {
        let pages = vec![
            page(1, "北京 天安门 故宫"),
            page(2, "上海 外滩 浦东"),
            page(3, "北京 上海 高铁"),
        ];
        let builder = InvertedIndexBuilder::build(&pages, &tokenizer());

        // L2 norm per document over all emitted weights
        let mut norms: HashMap<u32, f64> = HashMap::new();
        for term_postings in builder.weights.values() {
            for (docid, weight) in term_postings {
                *norms.entry(*docid).or_insert(0.0) += weight * weight;
            }
        }
        for (docid, norm_squared) in norms {
            assert!(
                (norm_squared - 1.0).abs() < 1e-9,
                "docid {} norm^2 = {}",
                docid,
                norm_squared
            );
        }
    }

    #[test]
    fn postings_sorted_and_terms_ordered() {
        let pages = vec![
            page(2, "中国 发展"),
            page(1, "中国 历史"),
        ];
        let builder = InvertedIndexBuilder::build(&pages, &tokenizer());

        if let Some(postings) = builder.postings("中国") {
            assert!(postings.windows(2).all(|w| w[0].0 < w[1].0));
        }

        let terms: Vec<&String> = builder.weights.keys().collect();
        let mut sorted = terms.clone();
        sorted.sort();
        assert_eq!(terms, sorted);
    }

    #[test]
    fn write_format_has_fixed_precision() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inverted_index.dat");
        let pages = vec![page(1, "北京 中国"), page(2, "中国 上海")];
        let builder = InvertedIndexBuilder::build(&pages, &tokenizer());
        builder.write(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        for line in text.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            assert!(fields.len() >= 3 && fields.len() % 2 == 1);
            for pair in fields[1..].chunks_exact(2) {
                // weight printed as x.yyyyyy
                let weight = pair[1];
                let dot = weight.find('.').unwrap();
                assert_eq!(weight.len() - dot - 1, 6, "weight {}", weight);
            }
        }
    }
}
