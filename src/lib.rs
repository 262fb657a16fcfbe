//! Bilingual (Chinese + English) corpus search service.
//!
//! Offline, the `builder` modules tokenize corpora into per-language
//! lexicons and character indexes, deduplicate crawled pages with SimHash
//! and emit an L2-normalized TF-IDF inverted index. Online, a nonblocking
//! reactor feeds a bounded worker pool that answers two requests over a
//! length-prefixed TCP protocol: keyword recommendation (edit-distance
//! ranking) and vector-space page search (cosine similarity).
//!
//! Module map:
//! - `core`: configuration, error type, shared record types
//! - `analysis`: jieba-backed Chinese and ASCII English tokenization,
//!   stop-word sets
//! - `cache`: the mutex-guarded LRU shared by the hot paths
//! - `builder`: offline artifact construction
//! - `reader` / `store`: serving-time artifact access
//! - `search`: the recommendation and page-search engines
//! - `net`: framing codec, reactor, worker pool, dispatcher, server

pub mod analysis;
pub mod builder;
pub mod cache;
pub mod core;
pub mod net;
pub mod reader;
pub mod search;
pub mod store;
