//! Embedding provider abstraction used by the cache manager and the
//! semantic searcher.
//!
//! A provider pairs an embedder with a stable identity. The identity names
//! the cache file, so two providers that can produce different vectors must
//! never share one.

use anyhow::Result;

pub trait EmbedProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `paraphrase-MiniLM-L6-v2`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Maximum token length for this provider.
    fn max_len(&self) -> usize;
    /// Compute embeddings for a batch of input texts.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

pub mod local;
