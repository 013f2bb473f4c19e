use sift_core::{process_queries, process_queries_joined, DocumentStatus, ExecutionMode, SearchIndex};

const WORDS: [&str; 12] = [
    "cat", "dog", "parrot", "fluffy", "groomed", "tail", "collar", "eyes", "white", "black", "big", "small",
];

// Deterministic pseudo-random corpus, no external rng needed.
fn corpus(size: i32) -> SearchIndex {
    let mut index = SearchIndex::new("and with").unwrap();
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    for id in 0..size {
        let len = 2 + (next() % 8) as usize;
        let text: Vec<&str> = (0..len).map(|_| WORDS[(next() % WORDS.len() as u64) as usize]).collect();
        let status = if next() % 5 == 0 { DocumentStatus::Banned } else { DocumentStatus::Actual };
        let ratings: Vec<i32> = (0..(next() % 4)).map(|_| (next() % 21) as i32 - 10).collect();
        index.add_document(id, &text.join(" and "), status, &ratings).unwrap();
    }
    index
}

#[test]
fn sequential_and_parallel_rank_identically() {
    let index = corpus(500);
    let queries = [
        "cat fluffy",
        "dog -cat",
        "parrot groomed collar -white",
        "big small black white eyes tail",
        "-dog -cat fluffy",
        "nothing matches this",
        "with and",
    ];
    for query in queries {
        let seq = index.find_top_documents_with_mode(ExecutionMode::Sequential, query).unwrap();
        let par = index.find_top_documents_with_mode(ExecutionMode::Parallel, query).unwrap();
        let key = |docs: &[sift_core::Document]| docs.iter().map(|d| (d.id, d.rating)).collect::<Vec<_>>();
        assert_eq!(key(&seq), key(&par), "{query}");
        for (s, p) in seq.iter().zip(&par) {
            assert!((s.relevance - p.relevance).abs() < 1e-6);
        }
    }
}

#[test]
fn parallel_filters_match_sequential() {
    let index = corpus(300);
    let pred = |id: i32, status: DocumentStatus, rating: i32| status != DocumentStatus::Banned && id % 3 != 0 && rating > -5;
    let seq = index.find_top_documents_filtered(ExecutionMode::Sequential, "cat dog tail -eyes", pred).unwrap();
    let par = index.find_top_documents_filtered(ExecutionMode::Parallel, "cat dog tail -eyes", pred).unwrap();
    assert_eq!(seq.iter().map(|d| d.id).collect::<Vec<_>>(), par.iter().map(|d| d.id).collect::<Vec<_>>());
    for doc in &par {
        assert!(doc.id % 3 != 0 && doc.rating > -5);
        let (words, _) = index.match_document("cat dog tail -eyes", doc.id).unwrap();
        assert!(!words.is_empty());
    }
}

#[test]
fn parallel_match_equals_sequential() {
    let index = corpus(200);
    for id in index.document_ids() {
        for query in ["cat dog fluffy tail", "big -small white", "parrot -cat -dog eyes"] {
            let seq = index.match_document_with(ExecutionMode::Sequential, query, id).unwrap();
            let par = index.match_document_with(ExecutionMode::Parallel, query, id).unwrap();
            assert_eq!(seq, par, "{query} / {id}");
        }
    }
}

#[test]
fn parallel_removal_equals_sequential() {
    let mut seq = corpus(120);
    let mut par = corpus(120);
    for id in (0..120).step_by(7) {
        seq.remove_document_with(ExecutionMode::Sequential, id);
        par.remove_document_with(ExecutionMode::Parallel, id);
    }
    assert_eq!(seq.document_ids().collect::<Vec<_>>(), par.document_ids().collect::<Vec<_>>());
    for id in par.document_ids() {
        assert_eq!(seq.word_frequencies(id), par.word_frequencies(id));
    }
    for word in ["cat", "parrot", "small"] {
        assert_eq!(seq.inverse_document_freq(word), par.inverse_document_freq(word));
    }
}

#[test]
fn batch_keeps_query_order() {
    let index = corpus(100);
    let queries = vec!["cat".to_string(), "dog -cat".to_string(), "unknownword".to_string(), "tail".to_string()];
    let batched = process_queries(&index, &queries).unwrap();
    assert_eq!(batched.len(), queries.len());
    for (query, result) in queries.iter().zip(&batched) {
        assert_eq!(result, &index.find_top_documents(query).unwrap());
    }
    assert!(batched[2].is_empty());
    let joined = process_queries_joined(&index, &queries).unwrap();
    assert_eq!(joined, batched.concat());
}

#[test]
fn batch_reports_invalid_query() {
    let index = corpus(10);
    let err = process_queries(&index, &["cat", "--dog", "tail"]).unwrap_err();
    assert!(err.is_invalid_argument());
    assert!(err.to_string().contains("-dog"));
}
