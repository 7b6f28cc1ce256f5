use bookqa_core::traits::TextSearcher;
use bookqa_core::types::{LexicalDocument, SourceKind};
use bookqa_core::Error;
use bookqa_text::LexicalIndex;
use tempfile::TempDir;

fn corpus() -> Vec<LexicalDocument> {
    [
        "The Ganges is a major river in India.",
        "India's economy grew significantly after 1991.",
        "Cricket is the most popular sport in India.",
        "Monsoon rains feed every major river across the subcontinent.",
        "Space research began with sounding rockets launched from Thumba.",
    ]
    .iter()
    .enumerate()
    .map(|(id, text)| LexicalDocument::new(id, *text))
    .collect()
}

fn built() -> LexicalIndex {
    let mut index = LexicalIndex::in_memory().expect("index");
    index.build(&corpus()).expect("build");
    index
}

#[test]
fn query_before_build_is_not_ready() {
    let index = LexicalIndex::in_memory().unwrap();
    assert!(!index.is_ready());
    assert!(matches!(index.search("river", 5), Err(Error::IndexNotReady)));
    assert!(matches!(index.search_text("river", 5), Err(Error::IndexNotReady)));
}

#[test]
fn zero_overlap_documents_are_excluded() {
    let index = built();
    let hits = index.search("cricket stadium", 10).unwrap();
    assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![2]);

    assert!(index.search("quantum chromodynamics", 10).unwrap().is_empty());
}

#[test]
fn stop_word_only_query_returns_nothing() {
    let index = built();
    assert!(index.search("what is the", 10).unwrap().is_empty());
}

#[test]
fn scores_are_descending_and_bounded_by_k() {
    let index = built();
    let hits = index.search("major river India", 10).unwrap();
    assert!(hits.len() >= 3);
    for pair in hits.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }
    assert_eq!(index.search("major river India", 2).unwrap().len(), 2);
    assert!(index.search("major river India", 0).unwrap().is_empty());
}

#[test]
fn exact_phrase_outranks_partial_overlap() {
    let mut index = LexicalIndex::in_memory().unwrap();
    index
        .build(&[
            LexicalDocument::new(0, "The river flows past the old fort and the green valley."),
            LexicalDocument::new(1, "The old fort stands above the valley."),
            LexicalDocument::new(2, "A river crosses the plain."),
        ])
        .unwrap();

    let hits = index.search("river flows past the old fort", 3).unwrap();
    assert_eq!(hits[0].0, 0);
    assert!(hits.iter().skip(1).all(|h| h.1 < hits[0].1));
}

#[test]
fn long_phrase_document_outranks_repeated_single_term() {
    let filler: Vec<String> = (0..200).map(|i| format!("word{i}")).collect();
    let mut docs = vec![
        LexicalDocument::new(0, format!("river india {}", filler.join(" "))),
        LexicalDocument::new(1, "India India India"),
    ];
    docs.extend((2..30).map(|i| LexicalDocument::new(i, format!("river bank {i}"))));
    let mut index = LexicalIndex::in_memory().unwrap();
    index.build(&docs).unwrap();

    let hits = index.search("river india", 10).unwrap();
    assert_eq!(hits[0].0, 0, "{hits:?}");
    assert!(hits.iter().skip(1).all(|h| h.1 < hits[0].1), "{hits:?}");
    assert!(hits.iter().any(|h| h.0 == 1));
    for pair in hits.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }
}

#[test]
fn phrase_search_requires_adjacent_terms() {
    let index = built();
    let hits = index.search_phrase("popular sport", 5).unwrap();
    assert_eq!(hits.iter().map(|h| h.0).collect::<Vec<_>>(), vec![2]);
    assert!(index.search_phrase("sport popular", 5).unwrap().is_empty());
}

#[test]
fn add_replaces_documents_with_same_id() {
    let mut index = built();
    index.add(&LexicalDocument::new(2, "Hockey was once the national obsession.")).unwrap();
    assert_eq!(index.num_docs(), 5);
    assert!(index.search("cricket", 5).unwrap().is_empty());
    assert_eq!(index.search("hockey", 5).unwrap()[0].0, 2);

    index.add(&LexicalDocument::new(9, "Tea gardens cover the hills of Assam.")).unwrap();
    assert_eq!(index.num_docs(), 6);
}

#[test]
fn add_on_fresh_index_makes_it_searchable() {
    let mut index = LexicalIndex::in_memory().unwrap();
    index.add(&LexicalDocument::new(0, "Assam tea")).unwrap();
    assert!(index.is_ready());
    assert_eq!(index.search("tea", 3).unwrap()[0].0, 0);
}

#[test]
fn build_collapses_duplicate_ids_to_last() {
    let mut index = LexicalIndex::in_memory().unwrap();
    index
        .build(&[LexicalDocument::new(0, "first version"), LexicalDocument::new(0, "second version")])
        .unwrap();
    assert_eq!(index.num_docs(), 1);
    assert!(index.search("first", 3).unwrap().is_empty());
    assert_eq!(index.search("second", 3).unwrap().len(), 1);
}

#[test]
fn stored_embedding_is_returned_verbatim() {
    let mut index = LexicalIndex::in_memory().unwrap();
    let embedding = vec![0.25f32, -1.5, 3.0];
    index.add(&LexicalDocument::new(4, "Thumba rockets").with_embedding(embedding.clone())).unwrap();
    let doc = index.document(4).unwrap().expect("stored");
    assert_eq!(doc.text, "Thumba rockets");
    assert_eq!(doc.embedding, Some(embedding));
    assert!(index.document(5).unwrap().is_none());
}

#[test]
fn searcher_trait_tags_lexical_hits() {
    let index = built();
    let hits = index.search_text("river", 5).unwrap();
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|h| h.source == SourceKind::Lexical));
}

#[test]
fn reopened_index_reproduces_results() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("lexical");
    let probes = ["major river India", "economy 1991", "rockets Thumba", "sport"];

    let before: Vec<_> = {
        let mut index = LexicalIndex::create_in_dir(&dir).unwrap();
        index.build(&corpus()).unwrap();
        probes.iter().map(|q| index.search(q, 5).unwrap()).collect()
    };

    let reopened = LexicalIndex::open(&dir).expect("open");
    assert!(reopened.is_ready());
    for (q, expected) in probes.iter().zip(before) {
        assert_eq!(reopened.search(q, 5).unwrap(), expected, "query {q}");
    }
}

#[test]
fn opening_missing_dir_fails() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(LexicalIndex::open(&tmp.path().join("absent")), Err(Error::NotFound(_))));
}
