use crate::error::{Error, Result};
use crate::tokenizer::{is_valid_word, split_into_words};
use std::collections::BTreeSet;

/// Plus and minus words of a raw query, borrowed from the query text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Query<'q> {
    pub plus_words: BTreeSet<&'q str>,
    pub minus_words: BTreeSet<&'q str>,
}

struct QueryWord<'q> {
    data: &'q str,
    is_minus: bool,
    is_stop: bool,
}

fn parse_query_word<'q>(text: &'q str, stop_words: &BTreeSet<String>) -> Result<QueryWord<'q>> {
    let (data, is_minus) = match text.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    if data.is_empty() || data.starts_with('-') || !is_valid_word(data) {
        return Err(Error::invalid(format!("query word {text:?} is invalid")));
    }
    Ok(QueryWord { data, is_minus, is_stop: stop_words.contains(data) })
}

/// Parse `text` into deduplicated plus/minus sets with stop words removed.
/// A word given both ways is kept only as a minus-word.
pub fn parse_query<'q>(text: &'q str, stop_words: &BTreeSet<String>) -> Result<Query<'q>> {
    let mut query = Query::default();
    for word in split_into_words(text) {
        let word = parse_query_word(word, stop_words)?;
        if word.is_stop {
            continue;
        }
        if word.is_minus {
            query.minus_words.insert(word.data);
        } else {
            query.plus_words.insert(word.data);
        }
    }
    query.plus_words.retain(|w| !query.minus_words.contains(w));
    Ok(query)
}
