use anyhow::{anyhow, Result};

use scripture_core::traits::Retriever;
use scripture_core::types::{RawScore, Verse};
use scripture_vector::{cosine_similarity, CacheReport, CacheState, EmbedProvider, EmbeddingCache, SemanticSearcher, ThemeSearch, VectorIndex};

/// Maps a few keywords onto fixed axes.
struct AxisProvider;

impl EmbedProvider for AxisProvider {
    fn embedder_id(&self) -> &str { "axis" }
    fn dim(&self) -> usize { 3 }
    fn max_len(&self) -> usize { 64 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                let mut v = vec![0.0f32; 3];
                if t.contains("love") { v[0] += 1.0; }
                if t.contains("light") { v[1] += 1.0; }
                if t.contains("water") { v[2] += 1.0; }
                if t.contains("error") { return Err(anyhow!("cannot embed")); }
                Ok(v)
            })
            .collect()
    }
}

fn verse(id: i64, text: &str) -> Verse {
    Verse {
        id,
        name: format!("Psalms 1:{id}"),
        text: text.into(),
        book_name: "Psalms".into(),
        chapter_name: "Psalms 1".into(),
        translation: "kjv".into(),
    }
}

fn searcher(dir: &tempfile::TempDir) -> SemanticSearcher {
    let cache = EmbeddingCache::new(dir.path()).with_progress(false);
    let mut s = SemanticSearcher::with_cache(Box::new(AxisProvider), cache, 0.5);
    s.load(
        &[
            verse(1, "love never fails"),
            verse(2, "love and light"),
            verse(3, "still water"),
            verse(4, "nothing here"),
        ],
        false,
    )
    .expect("load");
    s
}

#[test]
fn cosine_handles_zero_vectors() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
}

#[test]
fn index_truncates_before_threshold() {
    let index = VectorIndex::new(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0]]);
    let hits = index.top_k(&[1.0, 0.0], Some(2), 0.5);
    assert_eq!(hits, vec![(0, 1.0), (2, 1.0)]);
    assert!(index.top_k(&[1.0, 0.0], None, 1.5).is_empty());
}

#[test]
fn search_orders_by_cosine_and_applies_threshold() {
    let dir = tempfile::tempdir().expect("tempdir");
    let s = searcher(&dir);
    let hits = s.search("love", Some(10), 0.5).expect("search");
    let ids: Vec<i64> = hits.iter().map(|h| h.verse.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(matches!(hits[0].score, RawScore::Cosine(c) if (c - 1.0).abs() < 1e-6));
    assert!(matches!(hits[1].score, RawScore::Cosine(c) if (c - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-4));

    let strict = s.search("love", Some(10), 0.9).expect("strict");
    assert_eq!(strict.len(), 1);
}

#[test]
fn retriever_uses_configured_threshold() {
    let dir = tempfile::tempdir().expect("tempdir");
    let s = searcher(&dir);
    let via_trait = s.retrieve("water", None).expect("retrieve");
    assert_eq!(via_trait.len(), 1);
    assert_eq!(via_trait[0].verse.id, 3);

    let themed = ThemeSearch(&s).retrieve("water", None).expect("theme");
    assert_eq!(themed, via_trait);
}

#[test]
fn load_reports_cache_outcome() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut s = searcher(&dir);
    let verses = [verse(1, "love never fails"), verse(2, "love and light"), verse(3, "still water"), verse(4, "nothing here")];
    let report = s.load(&verses, false).expect("reload");
    assert_eq!(report, CacheReport { initial_state: CacheState::Valid, recomputed: false, count: 4, dim: 3 });

    let report = s.load(&verses[..2], false).expect("shrink");
    assert_eq!(report.initial_state, CacheState::Stale);
    assert!(report.recomputed);
    assert_eq!(s.len(), 2);
}

#[test]
fn query_embedding_failure_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let s = searcher(&dir);
    assert!(s.search("error", None, 0.0).is_err());
}

#[test]
fn unloaded_searcher_returns_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let s = SemanticSearcher::new(Box::new(AxisProvider), dir.path(), 0.5);
    assert!(s.is_empty());
    assert!(s.search("love", None, 0.0).expect("search").is_empty());
}
