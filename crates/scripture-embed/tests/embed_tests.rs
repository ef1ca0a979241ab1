use scripture_core::config::{EmbeddingBackend, EmbeddingSettings};
use scripture_core::traits::Embedder;
use scripture_embed::{build_embedder, HashEmbedder};

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(384);
    let texts = vec!["God is love".to_string(), "god IS love!".to_string(), String::new()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    assert_eq!(embs.len(), 3);
    assert_eq!(embs[0].len(), 384, "embedding dim is 384");

    let norm: f32 = embs[0].iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    // Case and punctuation do not change the tokens
    for (a, b) in embs[0].iter().zip(embs[1].iter()) { assert!((a - b).abs() <= 1e-6); }
    assert!(embs[2].iter().all(|x| *x == 0.0), "empty text embeds to the zero vector");
}

#[test]
fn hash_embedder_similarity_follows_word_overlap() {
    let embedder = HashEmbedder::new(512);
    let embs = embedder
        .embed_batch(&["love one another".to_string(), "love one another always".to_string(), "the waters".to_string()])
        .unwrap();
    assert!(cosine(&embs[0], &embs[1]) > 0.8);
    assert!(cosine(&embs[0], &embs[1]) > cosine(&embs[0], &embs[2]));
}

#[test]
fn build_embedder_selects_backend() {
    let settings = EmbeddingSettings { backend: EmbeddingBackend::Hash, dim: 64, ..EmbeddingSettings::default() };
    let embedder = build_embedder(&settings).expect("hash backend");
    assert_eq!(embedder.dim(), 64);

    let missing = EmbeddingSettings {
        backend: EmbeddingBackend::Model,
        model_dir: "/definitely/not/a/model/dir".into(),
        ..EmbeddingSettings::default()
    };
    assert!(build_embedder(&missing).is_err());
}
