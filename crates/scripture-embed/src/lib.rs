//! scripture-embed
//!
//! Embedding backends behind `scripture_core::traits::Embedder`: a candle
//! BERT sentence encoder loaded from local files, and a deterministic hash
//! embedder that needs no weights.

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info};
use twox_hash::XxHash64;

use scripture_core::config::{EmbeddingBackend, EmbeddingSettings};
use scripture_core::traits::Embedder;

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;

/// Sentence-transformer encoder (e.g. paraphrase-MiniLM-L6-v2).
///
/// `model_dir` must hold `tokenizer.json`, `config.json` and
/// `pytorch_model.bin`.
pub struct BertEmbedder { model: BertModel, tokenizer: Tokenizer, device: Device, dim: usize, max_len: usize }

impl BertEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        if !model_dir.exists() {
            return Err(anyhow!("Model directory not found: {}", model_dir.display()));
        }
        let device = device::select_device();
        info!(dir = %model_dir.display(), "loading sentence encoder");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e))?;
        let config_path = model_dir.join("config.json");
        let config: BertConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)
            .map_err(|e| anyhow!("Invalid model config {}: {}", config_path.display(), e))?;
        let weights_path = model_dir.join("pytorch_model.bin");
        let weights: HashMap<String, Tensor> = candle_core::pickle::read_all(&weights_path)?.into_iter().collect();
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config)?;
        let dim = config.hidden_size;
        info!(dim, "sentence encoder ready");
        Ok(Self { model, tokenizer, device, dim, max_len })
    }
}

impl Embedder for BertEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() { return Ok(Vec::new()); }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize::tokenize_batch(&self.tokenizer, texts, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let vectors: Vec<Vec<f32>> = pooled.to_device(&Device::Cpu)?.to_vec2()?;
        debug!(batch = texts.len(), elapsed_ms = start.elapsed().as_millis() as u64, "encoded batch");
        Ok(vectors)
    }
}

/// Projects lower-cased word tokens onto `dim` buckets with xxHash64 and
/// L2-normalizes the counts. Texts sharing words get similar vectors.
#[derive(Debug, Clone)]
pub struct HashEmbedder { dim: usize }

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lower = text.to_lowercase();
        for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += if h >> 63 == 0 { 1.0 } else { -1.0 };
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    match settings.backend {
        EmbeddingBackend::Hash => {
            info!(dim = settings.dim, "using hash embedder");
            Ok(Box::new(HashEmbedder::new(settings.dim)))
        }
        EmbeddingBackend::Model => Ok(Box::new(BertEmbedder::load(Path::new(&settings.model_dir), settings.max_len)?)),
    }
}
