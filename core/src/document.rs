use serde::{Deserialize, Serialize};

pub type DocId = i32;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    #[default]
    Actual,
    Irrelevant,
    Banned,
    Removed,
}

/// A ranked search hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub relevance: f64,
    pub rating: i32,
}

impl Document {
    pub fn new(id: DocId, relevance: f64, rating: i32) -> Self { Self { id, relevance, rating } }
}

/// Per-document metadata kept by the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocMeta {
    pub rating: i32,
    pub status: DocumentStatus,
}

/// Integer average of `ratings`, rounded down; 0 when empty.
pub fn average_rating(ratings: &[i32]) -> i32 {
    if ratings.is_empty() { return 0; }
    let sum: i64 = ratings.iter().map(|&r| r as i64).sum();
    sum.div_euclid(ratings.len() as i64) as i32
}
