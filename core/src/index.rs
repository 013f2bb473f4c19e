//! TF-IDF inverted index over short documents.
//!
//! Two mirrored postings maps are kept in lockstep: word -> (doc -> tf) and
//! doc -> (word -> tf). Words are interned once; both maps key on [`WordId`].
//! Reads (`find_*`, `match_*`, `word_frequencies`) take `&self` and may run
//! concurrently; mutation needs `&mut self`.

use crate::concurrent_map::ShardedMap;
use crate::document::{average_rating, DocId, DocMeta, Document, DocumentStatus};
use crate::error::{Error, Result};
use crate::interner::{WordId, WordInterner};
use crate::query::{parse_query, Query};
use crate::tokenizer::{is_valid_word, split_into_words, unique_non_empty};
use crate::{
    MAX_RESULT_DOCUMENT_COUNT, MINUS_SHARD_COUNT, PLUS_PART_COUNT, PLUS_SHARD_COUNT, RELEVANCE_EPSILON,
};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::{btree_set, BTreeMap, BTreeSet};
use std::iter::Copied;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Parallel,
}

/// Words of one document that matched a query, plus its status (`None` if the id is unknown).
pub type MatchResult<'a> = (Vec<&'a str>, Option<DocumentStatus>);

type Postings = BTreeMap<DocId, f64>;

#[derive(Debug, Default)]
pub struct SearchIndex {
    stop_words: BTreeSet<String>,
    interner: WordInterner,
    word_to_document_freqs: FxHashMap<WordId, Postings>,
    document_to_word_freqs: BTreeMap<DocId, BTreeMap<WordId, f64>>,
    documents: BTreeMap<DocId, DocMeta>,
    document_ids: BTreeSet<DocId>,
}

impl SearchIndex {
    /// Stop words given as one space-separated string.
    pub fn new(stop_words_text: &str) -> Result<Self> { Self::with_stop_words(split_into_words(stop_words_text)) }

    pub fn with_stop_words<I, S>(stop_words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words = unique_non_empty(stop_words);
        if let Some(bad) = stop_words.iter().find(|w| !is_valid_word(w)) {
            return Err(Error::invalid(format!("stop word {bad:?} is invalid")));
        }
        Ok(Self { stop_words, ..Self::default() })
    }

    pub fn stop_words(&self) -> &BTreeSet<String> { &self.stop_words }

    pub fn add_document(&mut self, id: DocId, text: &str, status: DocumentStatus, ratings: &[i32]) -> Result<()> {
        if id < 0 {
            return Err(Error::invalid(format!("document id {id} is negative")));
        }
        if self.documents.contains_key(&id) {
            return Err(Error::invalid(format!("document id {id} already exists")));
        }
        let words = self.split_into_words_no_stop(text)?;

        // intern first so a full word table leaves the postings untouched
        let word_ids = words.iter().map(|word| self.interner.intern(word)).collect::<Result<Vec<_>>>()?;

        let inv_word_count = 1.0 / words.len() as f64;
        let word_freqs = self.document_to_word_freqs.entry(id).or_default();
        for &word_id in &word_ids {
            *self.word_to_document_freqs.entry(word_id).or_default().entry(id).or_default() += inv_word_count;
            *word_freqs.entry(word_id).or_default() += inv_word_count;
        }
        let rating = average_rating(ratings);
        self.documents.insert(id, DocMeta { rating, status });
        self.document_ids.insert(id);
        tracing::debug!(id, words = words.len(), rating, ?status, "document added");
        Ok(())
    }

    pub fn remove_document(&mut self, id: DocId) { self.remove_document_with(ExecutionMode::Sequential, id) }

    /// Unknown ids are ignored.
    pub fn remove_document_with(&mut self, mode: ExecutionMode, id: DocId) {
        if self.documents.remove(&id).is_none() {
            return;
        }
        self.document_ids.remove(&id);
        let word_freqs = self.document_to_word_freqs.remove(&id).unwrap_or_default();

        match mode {
            ExecutionMode::Sequential => {
                for word_id in word_freqs.keys() {
                    if let Some(postings) = self.word_to_document_freqs.get_mut(word_id) {
                        postings.remove(&id);
                        if postings.is_empty() {
                            self.word_to_document_freqs.remove(word_id);
                        }
                    }
                }
            }
            ExecutionMode::Parallel => {
                // Each entry only touches its own postings.
                self.word_to_document_freqs.par_iter_mut().for_each(|(_, postings)| {
                    postings.remove(&id);
                });
                self.word_to_document_freqs.retain(|_, postings| !postings.is_empty());
            }
        }
        tracing::debug!(id, ?mode, "document removed");
    }

    pub fn find_top_documents(&self, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_with_mode(ExecutionMode::Sequential, raw_query)
    }

    pub fn find_top_documents_by_status(&self, raw_query: &str, status: DocumentStatus) -> Result<Vec<Document>> {
        self.find_top_documents_by_status_with_mode(ExecutionMode::Sequential, raw_query, status)
    }

    pub fn find_top_documents_with<P>(&self, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        self.find_top_documents_filtered(ExecutionMode::Sequential, raw_query, predicate)
    }

    pub fn find_top_documents_with_mode(&self, mode: ExecutionMode, raw_query: &str) -> Result<Vec<Document>> {
        self.find_top_documents_by_status_with_mode(mode, raw_query, DocumentStatus::Actual)
    }

    pub fn find_top_documents_by_status_with_mode(
        &self,
        mode: ExecutionMode,
        raw_query: &str,
        status: DocumentStatus,
    ) -> Result<Vec<Document>> {
        self.find_top_documents_filtered(mode, raw_query, move |_, document_status, _| document_status == status)
    }

    /// Top documents passing `predicate(id, status, rating)`, best first, at most
    /// [`MAX_RESULT_DOCUMENT_COUNT`] of them.
    pub fn find_top_documents_filtered<P>(&self, mode: ExecutionMode, raw_query: &str, predicate: P) -> Result<Vec<Document>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let query = parse_query(raw_query, &self.stop_words)?;
        let relevance = match mode {
            ExecutionMode::Sequential => self.relevance_sequential(&query, &predicate)?,
            ExecutionMode::Parallel => self.relevance_parallel(&query, &predicate)?,
        };
        let mut matched = self.collect_documents(relevance)?;
        sort_by_rank(&mut matched);
        matched.truncate(MAX_RESULT_DOCUMENT_COUNT);
        tracing::debug!(query = raw_query, ?mode, hits = matched.len(), "search finished");
        Ok(matched)
    }

    pub fn document_count(&self) -> usize { self.documents.len() }

    /// Live document ids in ascending order.
    pub fn document_ids(&self) -> Copied<btree_set::Iter<'_, DocId>> { self.document_ids.iter().copied() }

    /// Word -> term frequency for one document; empty if the id is unknown.
    pub fn word_frequencies(&self, id: DocId) -> BTreeMap<&str, f64> {
        self.document_to_word_freqs
            .get(&id)
            .map(|freqs| freqs.iter().map(|(&word_id, &tf)| (self.interner.resolve(word_id), tf)).collect())
            .unwrap_or_default()
    }

    /// `ln(document_count / documents_containing(word))`, or `None` for unindexed words.
    pub fn inverse_document_freq(&self, word: &str) -> Option<f64> { self.postings(word).map(|p| self.idf(p)) }

    pub fn match_document<'a>(&'a self, raw_query: &str, id: DocId) -> Result<MatchResult<'a>> {
        self.match_document_with(ExecutionMode::Sequential, raw_query, id)
    }

    /// Plus-words present in document `id`. If any minus-word is present the
    /// list is emptied, but the status is still reported.
    pub fn match_document_with<'a>(&'a self, mode: ExecutionMode, raw_query: &str, id: DocId) -> Result<MatchResult<'a>> {
        let query = parse_query(raw_query, &self.stop_words)?;
        let Some(meta) = self.documents.get(&id) else {
            return Ok((Vec::new(), None));
        };
        let Some(word_freqs) = self.document_to_word_freqs.get(&id) else {
            return Err(Error::Internal(format!("document {id} has metadata but no postings")));
        };
        let lookup = |word: &str| self.interner.get(word).filter(|word_id| word_freqs.contains_key(word_id));

        let matched: Vec<&'a str> = match mode {
            ExecutionMode::Sequential => {
                if query.minus_words.iter().any(|&w| lookup(w).is_some()) {
                    Vec::new()
                } else {
                    query.plus_words.iter().filter_map(|&w| lookup(w)).map(|wid| self.interner.resolve(wid)).collect()
                }
            }
            ExecutionMode::Parallel => {
                let minus: Vec<&str> = query.minus_words.iter().copied().collect();
                if minus.par_iter().any(|&w| lookup(w).is_some()) {
                    Vec::new()
                } else {
                    let plus: Vec<&str> = query.plus_words.iter().copied().collect();
                    plus.par_iter().filter_map(|&w| lookup(w)).map(|wid| self.interner.resolve(wid)).collect()
                }
            }
        };
        Ok((matched, Some(meta.status)))
    }

    fn split_into_words_no_stop<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        let mut words = Vec::new();
        for word in split_into_words(text) {
            if !is_valid_word(word) {
                return Err(Error::invalid(format!("word {word:?} is invalid")));
            }
            if !self.stop_words.contains(word) {
                words.push(word);
            }
        }
        Ok(words)
    }

    fn postings(&self, word: &str) -> Option<&Postings> {
        self.interner.get(word).and_then(|word_id| self.word_to_document_freqs.get(&word_id))
    }

    fn idf(&self, postings: &Postings) -> f64 { (self.document_count() as f64 / postings.len() as f64).ln() }

    fn meta(&self, id: DocId) -> Result<&DocMeta> {
        self.documents.get(&id).ok_or_else(|| Error::Internal(format!("posting refers to unknown document {id}")))
    }

    fn relevance_sequential<P>(&self, query: &Query<'_>, predicate: &P) -> Result<BTreeMap<DocId, f64>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool,
    {
        let mut document_to_relevance: BTreeMap<DocId, f64> = BTreeMap::new();
        for word in &query.plus_words {
            let Some(postings) = self.postings(word) else { continue };
            let idf = self.idf(postings);
            for (&id, &tf) in postings {
                let meta = self.meta(id)?;
                if predicate(id, meta.status, meta.rating) {
                    *document_to_relevance.entry(id).or_default() += tf * idf;
                }
            }
        }
        for word in &query.minus_words {
            let Some(postings) = self.postings(word) else { continue };
            for id in postings.keys() {
                document_to_relevance.remove(id);
            }
        }
        Ok(document_to_relevance)
    }

    fn relevance_parallel<P>(&self, query: &Query<'_>, predicate: &P) -> Result<BTreeMap<DocId, f64>>
    where
        P: Fn(DocId, DocumentStatus, i32) -> bool + Sync,
    {
        let minus_ids: ShardedMap<DocId, ()> = ShardedMap::new(MINUS_SHARD_COUNT);
        let minus: Vec<&str> = query.minus_words.iter().copied().collect();
        minus.par_iter().for_each(|word| {
            if let Some(postings) = self.postings(word) {
                for &id in postings.keys() {
                    let _ = minus_ids.access(id);
                }
            }
        });
        let excluded: BTreeSet<DocId> = minus_ids.into_map().into_keys().collect();
        tracing::trace!(excluded = excluded.len(), "minus-word phase done");

        let plus: Vec<&str> = query.plus_words.iter().copied().collect();
        let chunk_len = plus.len().div_ceil(PLUS_PART_COUNT).max(1);
        let document_to_relevance: ShardedMap<DocId, f64> = ShardedMap::new(PLUS_SHARD_COUNT);
        plus.par_chunks(chunk_len).try_for_each(|chunk| -> Result<()> {
            for word in chunk {
                let Some(postings) = self.postings(word) else { continue };
                let idf = self.idf(postings);
                for (&id, &tf) in postings {
                    if excluded.contains(&id) {
                        continue;
                    }
                    let meta = self.meta(id)?;
                    if predicate(id, meta.status, meta.rating) {
                        *document_to_relevance.access(id) += tf * idf;
                    }
                }
            }
            Ok(())
        })?;
        tracing::trace!(chunks = plus.len().div_ceil(chunk_len), "plus-word phase done");
        Ok(document_to_relevance.into_map())
    }

    fn collect_documents(&self, relevance: BTreeMap<DocId, f64>) -> Result<Vec<Document>> {
        relevance.into_iter().map(|(id, relevance)| Ok(Document::new(id, relevance, self.meta(id)?.rating))).collect()
    }
}

impl<'a> IntoIterator for &'a SearchIndex {
    type Item = DocId;
    type IntoIter = Copied<btree_set::Iter<'a, DocId>>;

    fn into_iter(self) -> Self::IntoIter { self.document_ids() }
}

/// Relevance descending; a run of results closer than [`RELEVANCE_EPSILON`] to
/// the run's first result counts as tied and is ordered by rating descending, then id.
fn sort_by_rank(documents: &mut [Document]) {
    documents.sort_by(|l, r| r.relevance.total_cmp(&l.relevance));
    let mut start = 0;
    while start < documents.len() {
        let mut end = start + 1;
        while end < documents.len() && documents[start].relevance - documents[end].relevance < RELEVANCE_EPSILON {
            end += 1;
        }
        documents[start..end].sort_by(|l, r| match r.rating.cmp(&l.rating) {
            Ordering::Equal => l.id.cmp(&r.id),
            other => other,
        });
        start = end;
    }
}
