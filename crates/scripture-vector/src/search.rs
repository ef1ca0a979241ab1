use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use scripture_core::traits::Retriever;
use scripture_core::types::{RawScore, ScoredVerse, Verse};

use crate::cache::{CacheReport, EmbeddingCache};
use crate::embed_provider::EmbedProvider;

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; zero when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (na, nb) = (l2_norm(a), l2_norm(b));
    if na == 0.0 || nb == 0.0 { return 0.0; }
    a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>() / (na * nb)
}

/// Brute-force cosine index over row vectors.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex { rows: Vec<Vec<f32>>, norms: Vec<f32> }

impl VectorIndex {
    pub fn new(rows: Vec<Vec<f32>>) -> Self {
        let norms = rows.iter().map(|r| l2_norm(r)).collect();
        Self { rows, norms }
    }

    pub fn len(&self) -> usize { self.rows.len() }
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Top `limit` rows by similarity (ties keep row order), then those at
    /// or above `threshold`.
    pub fn top_k(&self, query: &[f32], limit: Option<usize>, threshold: f32) -> Vec<(usize, f32)> {
        let qn = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .rows
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (row, &n))| {
                let sim = if qn == 0.0 || n == 0.0 {
                    0.0
                } else {
                    row.iter().zip(query).map(|(x, y)| x * y).sum::<f32>() / (qn * n)
                };
                (i, sim)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        if let Some(k) = limit { scored.truncate(k); }
        scored.retain(|&(_, s)| s >= threshold);
        scored
    }
}

/// Meaning-based search over the loaded corpus.
pub struct SemanticSearcher {
    provider: Box<dyn EmbedProvider>,
    cache: EmbeddingCache,
    verses: Vec<Verse>,
    index: VectorIndex,
    threshold: f64,
}

impl SemanticSearcher {
    pub fn new(provider: Box<dyn EmbedProvider>, cache_dir: impl Into<PathBuf>, threshold: f64) -> Self {
        Self::with_cache(provider, EmbeddingCache::new(cache_dir), threshold)
    }

    pub fn with_cache(provider: Box<dyn EmbedProvider>, cache: EmbeddingCache, threshold: f64) -> Self {
        Self { provider, cache, verses: Vec::new(), index: VectorIndex::default(), threshold }
    }

    pub fn provider(&self) -> &dyn EmbedProvider { self.provider.as_ref() }
    pub fn threshold(&self) -> f64 { self.threshold }
    pub fn len(&self) -> usize { self.verses.len() }
    pub fn is_empty(&self) -> bool { self.verses.is_empty() }

    /// Loads the corpus and its embeddings through the cache.
    pub fn load(&mut self, verses: &[Verse], force_recompute: bool) -> Result<CacheReport> {
        let loaded = self.cache.load(self.provider.as_ref(), verses, force_recompute)?;
        let report = loaded.report();
        self.verses = verses.to_vec();
        self.index = VectorIndex::new(loaded.vectors);
        info!(count = report.count, recomputed = report.recomputed, "semantic index ready");
        Ok(report)
    }

    pub fn search(&self, query: &str, limit: Option<usize>, threshold: f64) -> Result<Vec<ScoredVerse>> {
        if self.index.is_empty() {
            warn!("no embeddings loaded for semantic search");
            return Ok(Vec::new());
        }
        let query_vec = self
            .provider
            .embed_batch(&[query.to_string()])?
            .pop()
            .ok_or_else(|| anyhow!("provider returned no vector for the query"))?;
        if query_vec.len() != self.provider.dim() {
            return Err(anyhow!("query vector has dimension {} (expected {})", query_vec.len(), self.provider.dim()));
        }
        let hits: Vec<ScoredVerse> = self
            .index
            .top_k(&query_vec, limit, threshold as f32)
            .into_iter()
            .map(|(i, sim)| ScoredVerse { verse: self.verses[i].clone(), score: RawScore::Cosine(f64::from(sim)) })
            .collect();
        debug!(query, hits = hits.len(), "semantic search");
        Ok(hits)
    }

    /// Thematic search. Uses the same similarity search as `search`.
    pub fn search_by_theme(&self, theme: &str, limit: Option<usize>, threshold: f64) -> Result<Vec<ScoredVerse>> {
        self.search(theme, limit, threshold)
    }
}

impl Retriever for SemanticSearcher {
    fn retrieve(&self, query: &str, limit: Option<usize>) -> Result<Vec<ScoredVerse>> {
        self.search(query, limit, self.threshold)
    }
}

/// Routes retrieval through `search_by_theme`.
pub struct ThemeSearch<'a>(pub &'a SemanticSearcher);

impl Retriever for ThemeSearch<'_> {
    fn retrieve(&self, query: &str, limit: Option<usize>) -> Result<Vec<ScoredVerse>> {
        self.0.search_by_theme(query, limit, self.0.threshold)
    }
}
