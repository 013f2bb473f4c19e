pub mod batch;
pub mod concurrent_map;
pub mod document;
pub mod error;
pub mod index;
pub mod interner;
pub mod query;
pub mod request_queue;
pub mod timing;
pub mod tokenizer;

pub use batch::{process_queries, process_queries_joined};
pub use concurrent_map::ShardedMap;
pub use document::{DocId, DocMeta, Document, DocumentStatus};
pub use error::{Error, Result};
pub use index::{ExecutionMode, MatchResult, SearchIndex};
pub use request_queue::RequestQueue;
pub use timing::LogDuration;

/// Results returned by one search, after ranking.
pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
/// Relevance values closer than this are ranked by rating instead.
pub const RELEVANCE_EPSILON: f64 = 1e-6;
/// Entries kept by [`RequestQueue`], one per minute of a day.
pub const REQUEST_WINDOW: usize = 1440;

pub(crate) const MINUS_SHARD_COUNT: usize = 10;
pub(crate) const PLUS_SHARD_COUNT: usize = 10_000;
pub(crate) const PLUS_PART_COUNT: usize = 4;
