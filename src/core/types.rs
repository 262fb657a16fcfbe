use serde::{Deserialize, Serialize};

/// Which lexicon / character index a word or query belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Chinese,
    English,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Chinese => "cn",
            Language::English => "en",
        }
    }
}

/// One dictionary line: `<word> <frequency>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub word: String,
    pub frequency: u64,
}

/// A crawled page after ingest cleanup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebPage {
    pub docid: u32,
    pub link: String,
    pub title: String,
    pub content: String,
}

/// Byte span of one serialized page inside the pages file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOffset {
    pub docid: u32,
    pub offset: u64,
    pub length: u64,
}
