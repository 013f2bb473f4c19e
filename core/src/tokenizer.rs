use std::collections::BTreeSet;

/// Split text into words on the ASCII space only. Tabs and newlines stay inside tokens.
pub fn split_into_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(' ').filter(|w| !w.is_empty())
}

/// A word is valid when it holds no control character (any byte below `' '`).
pub fn is_valid_word(word: &str) -> bool { !word.bytes().any(|b| b < b' ') }

/// Deduplicated, non-empty copies of `strings`.
pub fn unique_non_empty<I, S>(strings: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    strings
        .into_iter()
        .filter(|s| !s.as_ref().is_empty())
        .map(|s| s.as_ref().to_string())
        .collect()
}
