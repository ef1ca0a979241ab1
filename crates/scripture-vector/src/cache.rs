//! File-backed embedding cache keyed by embedder identity.
//!
//! One file per provider holds the ordered verse ids and their vectors. The
//! file is reused only when its id sequence equals the current corpus
//! position by position; anything else (missing, unreadable, checksum
//! mismatch, other provider, other ids) triggers a full recompute.
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use scripture_core::types::{Verse, VerseId};

use crate::embed_provider::EmbedProvider;

pub const CACHE_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Lifecycle of the cache for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No usable file on disk.
    Absent,
    /// A file exists but its id sequence differs from the corpus.
    Stale,
    /// The file matches the corpus exactly.
    Valid,
    /// Embeddings are being recomputed.
    Computing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheRecord {
    schema_version: u32,
    embedder_id: String,
    dim: u32,
    verse_count: u64,
    verse_ids: Vec<VerseId>,
    embeddings: Vec<Vec<f32>>,
    created_at: i64,
    checksum: String,
}

impl CacheRecord {
    fn new(embedder_id: &str, dim: usize, verse_ids: Vec<VerseId>, embeddings: Vec<Vec<f32>>) -> Self {
        let checksum = checksum(&verse_ids, &embeddings);
        Self {
            schema_version: CACHE_SCHEMA_VERSION,
            embedder_id: embedder_id.to_string(),
            dim: dim as u32,
            verse_count: verse_ids.len() as u64,
            verse_ids,
            embeddings,
            created_at: Utc::now().timestamp_millis(),
            checksum,
        }
    }

    /// Internal consistency only; corpus matching happens in `inspect`.
    fn verify(&self, provider: &dyn EmbedProvider) -> Result<()> {
        if self.schema_version != CACHE_SCHEMA_VERSION {
            return Err(anyhow!("schema version {} (expected {})", self.schema_version, CACHE_SCHEMA_VERSION));
        }
        if self.embedder_id != provider.embedder_id() {
            return Err(anyhow!("written by embedder '{}'", self.embedder_id));
        }
        if self.dim as usize != provider.dim() {
            return Err(anyhow!("dimension {} (provider has {})", self.dim, provider.dim()));
        }
        if self.verse_ids.len() as u64 != self.verse_count || self.embeddings.len() != self.verse_ids.len() {
            return Err(anyhow!("count mismatch: {} ids, {} vectors", self.verse_ids.len(), self.embeddings.len()));
        }
        if self.embeddings.iter().any(|v| v.len() != self.dim as usize) {
            return Err(anyhow!("vector with dimension other than {}", self.dim));
        }
        if checksum(&self.verse_ids, &self.embeddings) != self.checksum {
            return Err(anyhow!("checksum mismatch"));
        }
        Ok(())
    }
}

fn checksum(ids: &[VerseId], embeddings: &[Vec<f32>]) -> String {
    let mut hasher = blake3::Hasher::new();
    for id in ids {
        hasher.update(&id.to_le_bytes());
    }
    for v in embeddings {
        for x in v {
            hasher.update(&x.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Cache file name for a provider; characters outside `[A-Za-z0-9._-]`
/// become `_`.
pub fn cache_file_name(embedder_id: &str) -> String {
    let safe: String = embedder_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    format!("verse_embeddings_{safe}.bin")
}

/// Embedding matrix aligned with `verse_ids`, plus how it was obtained.
#[derive(Debug, Clone)]
pub struct LoadedEmbeddings {
    pub verse_ids: Vec<VerseId>,
    pub vectors: Vec<Vec<f32>>,
    pub dim: usize,
    /// State found on disk before any recompute.
    pub initial_state: CacheState,
    pub recomputed: bool,
}

impl LoadedEmbeddings {
    pub fn report(&self) -> CacheReport {
        CacheReport {
            initial_state: self.initial_state,
            recomputed: self.recomputed,
            count: self.verse_ids.len(),
            dim: self.dim,
        }
    }
}

/// How a load went, without the vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheReport {
    pub initial_state: CacheState,
    pub recomputed: bool,
    pub count: usize,
    pub dim: usize,
}

fn transition(from: CacheState, to: CacheState) {
    debug!(?from, ?to, "embedding cache transition");
}

pub struct EmbeddingCache {
    dir: PathBuf,
    batch_size: usize,
    show_progress: bool,
}

impl EmbeddingCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), batch_size: DEFAULT_BATCH_SIZE, show_progress: true }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn dir(&self) -> &Path { &self.dir }

    pub fn path_for(&self, provider: &dyn EmbedProvider) -> PathBuf {
        self.dir.join(cache_file_name(provider.embedder_id()))
    }

    /// Classifies the on-disk cache against the current id sequence.
    pub fn inspect(&self, provider: &dyn EmbedProvider, verse_ids: &[VerseId]) -> CacheState {
        self.read_matching(provider, verse_ids).0
    }

    fn read_matching(&self, provider: &dyn EmbedProvider, verse_ids: &[VerseId]) -> (CacheState, Option<CacheRecord>) {
        let path = self.path_for(provider);
        if !path.exists() {
            return (CacheState::Absent, None);
        }
        let record = match read_record(&path) {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable embedding cache, treating as absent");
                return (CacheState::Absent, None);
            }
        };
        if let Err(e) = record.verify(provider) {
            warn!(path = %path.display(), error = %e, "invalid embedding cache, treating as absent");
            return (CacheState::Absent, None);
        }
        if record.verse_ids.as_slice() != verse_ids {
            info!(cached = record.verse_ids.len(), current = verse_ids.len(), "embedding cache is stale");
            return (CacheState::Stale, None);
        }
        (CacheState::Valid, Some(record))
    }

    /// Returns embeddings for `verses` in order, reusing the cache file when
    /// it matches and recomputing (then persisting) otherwise.
    pub fn load(&self, provider: &dyn EmbedProvider, verses: &[Verse], force_recompute: bool) -> Result<LoadedEmbeddings> {
        let verse_ids: Vec<VerseId> = verses.iter().map(|v| v.id).collect();
        let (initial_state, record) = if force_recompute {
            debug!("forced embedding recompute");
            (CacheState::Absent, None)
        } else {
            self.read_matching(provider, &verse_ids)
        };

        if let Some(record) = record {
            info!(count = record.verse_count, embedder = provider.embedder_id(), "loaded cached embeddings");
            return Ok(LoadedEmbeddings {
                verse_ids,
                vectors: record.embeddings,
                dim: record.dim as usize,
                initial_state,
                recomputed: false,
            });
        }

        transition(initial_state, CacheState::Computing);
        let vectors = self.compute(provider, verses)?;
        let dim = provider.dim();
        let record = CacheRecord::new(provider.embedder_id(), dim, verse_ids, vectors);
        let path = self.path_for(provider);
        self.persist(&record, &path)?;
        transition(CacheState::Computing, CacheState::Valid);
        debug!(path = %path.display(), "embedding cache written");

        Ok(LoadedEmbeddings {
            verse_ids: record.verse_ids,
            vectors: record.embeddings,
            dim,
            initial_state,
            recomputed: true,
        })
    }

    fn compute(&self, provider: &dyn EmbedProvider, verses: &[Verse]) -> Result<Vec<Vec<f32>>> {
        let dim = provider.dim();
        info!(count = verses.len(), embedder = provider.embedder_id(), "computing verse embeddings");
        let pb = if self.show_progress { ProgressBar::new(verses.len() as u64) } else { ProgressBar::hidden() };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} verses ({percent}%)")?
                .progress_chars("#>-"),
        );

        let mut out = Vec::with_capacity(verses.len());
        for chunk in verses.chunks(self.batch_size) {
            let texts: Vec<String> = chunk.iter().map(|v| v.text.clone()).collect();
            let batch = provider
                .embed_batch(&texts)
                .with_context(|| format!("embedding batch starting at verse {}", chunk[0].id))?;
            if batch.len() != texts.len() {
                return Err(anyhow!("provider returned {} vectors for {} texts", batch.len(), texts.len()));
            }
            if let Some(bad) = batch.iter().find(|v| v.len() != dim) {
                return Err(anyhow!("provider returned dimension {} (expected {})", bad.len(), dim));
            }
            out.extend(batch);
            pb.inc(chunk.len() as u64);
        }
        pb.finish_and_clear();
        Ok(out)
    }

    fn persist(&self, record: &CacheRecord, path: &Path) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating cache directory {}", self.dir.display()))?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            bincode::serialize_into(&mut writer, record)?;
            writer.flush()?;
        }
        tmp.persist(path).with_context(|| format!("writing embedding cache {}", path.display()))?;
        Ok(())
    }
}

fn read_record(path: &Path) -> Result<CacheRecord> {
    let bytes = fs::read(path)?;
    Ok(bincode::deserialize(&bytes)?)
}
