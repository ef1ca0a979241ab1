use crate::ingest::BibleDocument;
use crate::types::{ScoredVerse, Verse};

/// Text → fixed-length vector. Implementations return L2-normalized vectors
/// of `dim()` components.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Persistent book/chapter/verse records.
pub trait VerseStore {
    fn verse_count(&self) -> anyhow::Result<usize>;
    /// Literal substring match over verse text and reference label.
    fn search_text(&self, query: &str, limit: Option<usize>) -> anyhow::Result<Vec<ScoredVerse>>;
    /// Every verse ordered by identity, optionally for one translation only.
    fn all_verses(&self, translation: Option<&str>) -> anyhow::Result<Vec<Verse>>;
    /// Distinct translation tags of the persisted books.
    fn translations(&self) -> anyhow::Result<Vec<String>>;
    /// Persists one parsed document; returns the number of verses written.
    fn import_bible(&mut self, doc: &BibleDocument, translation: &str) -> anyhow::Result<usize>;
    /// Replaces every persisted record with `docs` (translation, document)
    /// atomically; returns the number of verses written.
    fn replace_all(&mut self, docs: &[(String, BibleDocument)]) -> anyhow::Result<usize>;
}

/// One retrieval strategy as seen by the query fan-out.
pub trait Retriever {
    fn retrieve(&self, query: &str, limit: Option<usize>) -> anyhow::Result<Vec<ScoredVerse>>;
}
