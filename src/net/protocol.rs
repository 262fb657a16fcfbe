use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::search::engine::SearchResult;
use crate::search::recommender::Candidate;

/// JSON payload schemas carried inside frames (§ wire protocol).
///
/// `k` and `topN` may be absent from requests; the dispatcher substitutes
/// the configured defaults.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<usize>,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(rename = "topN", default, skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub query: String,
    pub timestamp: i64,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub timestamp: i64,
    pub total: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: i32,
    pub timestamp: i64,
}

pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

impl RecommendRequest {
    pub fn new(query: impl Into<String>, k: usize) -> Self {
        RecommendRequest {
            query: query.into(),
            k: Some(k),
            timestamp: now_timestamp(),
        }
    }
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, top_n: usize) -> Self {
        SearchRequest {
            query: query.into(),
            top_n: Some(top_n),
            timestamp: now_timestamp(),
        }
    }
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: i32) -> Self {
        ErrorResponse {
            error: error.into(),
            code,
            timestamp: now_timestamp(),
        }
    }
}
