use crate::document::Document;
use crate::error::Result;
use crate::index::SearchIndex;
use rayon::prelude::*;

/// Run every query (status ACTUAL) on the rayon pool. Results keep input
/// order; the first failing query in input order is reported.
pub fn process_queries<S>(index: &SearchIndex, queries: &[S]) -> Result<Vec<Vec<Document>>>
where
    S: AsRef<str> + Sync,
{
    let results: Vec<Result<Vec<Document>>> =
        queries.par_iter().map(|query| index.find_top_documents(query.as_ref())).collect();
    results.into_iter().collect()
}

pub fn process_queries_joined<S>(index: &SearchIndex, queries: &[S]) -> Result<Vec<Document>>
where
    S: AsRef<str> + Sync,
{
    Ok(process_queries(index, queries)?.into_iter().flatten().collect())
}
