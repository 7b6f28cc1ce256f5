use bookqa_core::config::EmbeddingSettings;
use bookqa_embed::{default_embedder, Embedder, HashEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn fake_embedder_shapes_and_determinism() {
    let settings = EmbeddingSettings { fake: true, dimension: 384, ..Default::default() };
    let embedder = default_embedder(&settings).expect("embedder");
    let texts = vec!["hello world".to_string(), "hello world".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let v1 = &embs[0];
    let v2 = &embs[1];

    assert_eq!(v1.len(), 384, "embedding dim follows settings");

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn hash_embedder_ignores_case_and_punctuation() {
    let embedder = HashEmbedder::new(256).unwrap();
    let a = embedder.embed("Rivers, of India!").unwrap();
    let b = embedder.embed("rivers of india").unwrap();
    assert!((dot(&a, &b) - 1.0).abs() < 1e-5);
}

#[test]
fn hash_embedder_empty_text_is_zero_vector() {
    let embedder = HashEmbedder::new(64).unwrap();
    let v = embedder.embed("  ...  ").unwrap();
    assert!(v.iter().all(|x| *x == 0.0));
}

#[test]
fn shared_tokens_raise_similarity() {
    let embedder = HashEmbedder::new(1024).unwrap();
    let q = embedder.embed("ganges river").unwrap();
    let near = embedder.embed("the ganges river flows east").unwrap();
    let far = embedder.embed("cricket sport stadium").unwrap();
    assert!(dot(&q, &near) > dot(&q, &far));
}

#[test]
fn zero_dimension_is_rejected() {
    assert!(HashEmbedder::new(0).is_err());
    let settings = EmbeddingSettings { fake: true, dimension: 0, ..Default::default() };
    assert!(default_embedder(&settings).is_err());
}
