use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub type WordId = u32;

/// Owns one copy of every distinct word; postings refer to words by `WordId`.
#[derive(Debug, Default)]
pub struct WordInterner {
    words: Vec<Arc<str>>,
    ids: FxHashMap<Arc<str>, WordId>,
}

impl WordInterner {
    pub fn new() -> Self { Self::default() }

    /// Id for `word`, storing it on first sight. Fails once `WordId` is exhausted.
    pub fn intern(&mut self, word: &str) -> Result<WordId> {
        if let Some(&id) = self.ids.get(word) {
            return Ok(id);
        }
        let id = next_id(self.words.len())?;
        let stored: Arc<str> = Arc::from(word);
        self.words.push(Arc::clone(&stored));
        self.ids.insert(stored, id);
        Ok(id)
    }

    pub fn get(&self, word: &str) -> Option<WordId> { self.ids.get(word).copied() }

    /// Panics if `id` was not issued by this interner.
    pub fn resolve(&self, id: WordId) -> &str { &self.words[id as usize] }

    pub fn len(&self) -> usize { self.words.len() }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }
}

fn next_id(len: usize) -> Result<WordId> {
    WordId::try_from(len).map_err(|_| Error::Internal(format!("word table is full at {len} words")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn id_space_is_bounded() {
        assert_eq!(next_id(0).unwrap(), 0);
        assert_eq!(next_id(u32::MAX as usize).unwrap(), u32::MAX);
        assert!(matches!(next_id(u32::MAX as usize + 1), Err(Error::Internal(_))));
    }

    #[test]
    fn interns_each_word_once() {
        let mut interner = WordInterner::new();
        let cat = interner.intern("cat").unwrap();
        let dog = interner.intern("dog").unwrap();
        assert_ne!(cat, dog);
        assert_eq!(interner.intern("cat").unwrap(), cat);
        assert_eq!(interner.len(), 2);
        assert_eq!(interner.resolve(dog), "dog");
        assert_eq!(interner.get("cat"), Some(cat));
        assert_eq!(interner.get("bird"), None);
    }
}
