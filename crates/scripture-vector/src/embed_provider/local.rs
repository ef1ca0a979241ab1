//! Local embedding provider backed by `scripture-embed`.

use anyhow::Result;
use scripture_core::config::{EmbeddingBackend, EmbeddingSettings};
use scripture_core::traits::Embedder;
use scripture_embed::build_embedder;

use super::EmbedProvider;

pub struct LocalProvider {
    inner: Box<dyn Embedder>,
    id: String,
}

impl LocalProvider {
    pub fn new(inner: Box<dyn Embedder>, id: impl Into<String>) -> Self {
        Self { inner, id: id.into() }
    }

    /// Builds the configured backend. The model backend is identified by its
    /// model name, the hash backend by its dimension.
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let inner = build_embedder(settings)?;
        let id = match settings.backend {
            EmbeddingBackend::Model => settings.model_name.clone(),
            EmbeddingBackend::Hash => format!("hash:d{}", inner.dim()),
        };
        Ok(Self { inner, id })
    }
}

impl EmbedProvider for LocalProvider {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { self.inner.embed_batch(texts) }
}
