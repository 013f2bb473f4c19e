//! Bounded history of recent searches.
//!
//! Every returned document is one entry; a search with no hits records a
//! single sentinel entry. Once the history holds more than the window, the
//! oldest entries are dropped one at a time, so a search with many hits uses
//! many slots.

use crate::document::{DocId, Document, DocumentStatus};
use crate::error::Result;
use crate::index::SearchIndex;
use crate::REQUEST_WINDOW;
use std::collections::VecDeque;
use std::sync::Arc;

/// Recorded in place of documents when a search found nothing.
pub const NO_RESULT: Document = Document { id: -1, relevance: -1.1, rating: -1 };

#[derive(Debug, Clone)]
struct Entry {
    query: Arc<str>,
    document: Document,
}

impl Entry {
    fn is_no_result(&self) -> bool { self.document.id == NO_RESULT.id && self.document.rating == NO_RESULT.rating }
}

pub struct RequestQueue<'a> {
    index: &'a SearchIndex,
    requests: VecDeque<Entry>,
    window: usize,
}

impl<'a> RequestQueue<'a> {
    pub fn new(index: &'a SearchIndex) -> Self { Self::with_window(index, REQUEST_WINDOW) }

    pub fn with_window(index: &'a SearchIndex, window: usize) -> Self {
        Self { index, requests: VecDeque::new(), window }
    }

    pub fn add_find_request(&mut self, raw_query: &str) -> Result<Vec<Document>> {
        self.add_find_request_by_status(raw_query, DocumentStatus::Actual)
    }

    pub fn add_find_request_by_status(&mut self, raw_query: &str, status: DocumentStatus) -> Result<Vec<Document>> {
        self.add_find_request_with(raw_query, move |_, document_status, _| document_status == status)
    }

    pub fn add_find_request_with<P>(&mut self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let documents = self.index.find_top_documents_with(raw_query, predicate)?;
        let query: Arc<str> = Arc::from(raw_query);
        if documents.is_empty() {
            self.requests.push_back(Entry { query, document: NO_RESULT });
        } else {
            self.requests.extend(documents.iter().map(|&document| Entry { query: Arc::clone(&query), document }));
        }
        while self.requests.len() > self.window {
            self.requests.pop_front();
        }
        Ok(documents)
    }

    /// Sentinel entries still inside the window.
    pub fn no_result_requests(&self) -> usize { self.requests.iter().filter(|e| e.is_no_result()).count() }

    /// Entries currently held.
    pub fn len(&self) -> usize { self.requests.len() }

    pub fn is_empty(&self) -> bool { self.requests.is_empty() }

    /// Query text of the oldest entry still held.
    pub fn oldest_query(&self) -> Option<&str> { self.requests.front().map(|e| &*e.query) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_shape() {
        let entry = Entry { query: Arc::from("x"), document: NO_RESULT };
        assert!(entry.is_no_result());
        let hit = Entry { query: Arc::from("x"), document: Document::new(3, 0.2, -1) };
        assert!(!hit.is_no_result());
    }

    #[test]
    fn failed_query_records_nothing() {
        let index = SearchIndex::new("").unwrap();
        let mut queue = RequestQueue::new(&index);
        assert!(queue.add_find_request("--cat").is_err());
        assert!(queue.is_empty());
    }
}
