use std::fs;

use bookqa_core::config::Config;
use bookqa_core::types::Chunk;
use bookqa_core::{ChunkStore, Error};
use tempfile::TempDir;

#[test]
fn lines_file_skips_blank_lines_and_numbers_densely() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("tokenized_chunks.txt");
    fs::write(&path, "first chunk\n\n   \nsecond chunk\nthird chunk\n").unwrap();

    let store = ChunkStore::load(&path).expect("load");
    assert_eq!(store.len(), 3);
    for (i, c) in store.iter().enumerate() {
        assert_eq!(c.id, i);
    }
    assert_eq!(store.get(1).unwrap().text, "second chunk");
    assert!(store.get(3).is_none());
}

#[test]
fn empty_corpus_is_refused() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.txt");
    fs::write(&path, "\n\n").unwrap();
    assert!(matches!(ChunkStore::load(&path), Err(Error::CorpusEmpty)));
    assert!(matches!(ChunkStore::from_texts(Vec::<String>::new()), Err(Error::CorpusEmpty)));
}

#[test]
fn missing_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = ChunkStore::load(&tmp.path().join("nope.txt")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn json_passages_round_trip() {
    let tmp = TempDir::new().unwrap();
    let store = ChunkStore::from_texts(["alpha bravo", "charlie delta"]).unwrap();
    let path = tmp.path().join("book.json");
    store.write_json(&path).unwrap();

    let reloaded = ChunkStore::load(&path).expect("load json");
    assert_eq!(reloaded.texts(), store.texts());
}

#[test]
fn out_of_order_ids_are_rejected() {
    let chunks = vec![
        Chunk { id: 1, text: "b".into() },
        Chunk { id: 0, text: "a".into() },
    ];
    assert!(matches!(ChunkStore::from_chunks(chunks), Err(Error::InvalidConfig(_))));
}

#[test]
fn config_layers_toml_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file(
            "config.toml",
            r#"
            [retrieval]
            top_k = 3
            use_lexical = false

            [fallback]
            subject = "the report"
            "#,
        )?;
        jail.create_file("config.test.toml", "[retrieval]\nmin_score = 0.25\n")?;
        jail.set_env("APP_RETRIEVAL__TOP_K", "7");

        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.retrieval.top_k, 7);
        assert!(!settings.retrieval.use_lexical);
        assert_eq!(settings.retrieval.min_score, Some(0.25));
        assert_eq!(settings.retrieval.sentences_per_candidate, 2);
        assert_eq!(settings.fallback.subject, "the report");

        let top_k: usize = config.get("retrieval.top_k").map_err(|e| e.to_string())?;
        assert_eq!(top_k, 7);
        Ok(())
    });
}

#[test]
fn invalid_config_fails_at_load() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file("config.toml", "[retrieval]\nsentences_per_candidate = 0\n")?;
        assert!(matches!(Config::load(), Err(Error::InvalidConfig(_))));
        Ok(())
    });
}
