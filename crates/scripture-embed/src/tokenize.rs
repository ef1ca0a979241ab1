use anyhow::{Result, anyhow};
use candle_core::{Device, Tensor};
use tokenizers::Tokenizer;

const PAD_ID: u32 = 0;

/// Encodes `texts` into `[batch, seq]` id and attention-mask tensors, padded
/// to the longest encoding and truncated to `max_len`.
pub fn tokenize_batch(tokenizer: &Tokenizer, texts: &[String], max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let mut rows = Vec::with_capacity(texts.len());
    for text in texts {
        let enc = tokenizer.encode(text.as_str(), true).map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        let mut mask = enc.get_attention_mask().to_vec();
        ids.truncate(max_len);
        mask.truncate(max_len);
        rows.push((ids, mask));
    }
    let seq = rows.iter().map(|(ids, _)| ids.len()).max().unwrap_or(0).max(1);
    let mut flat_ids = Vec::with_capacity(rows.len() * seq);
    let mut flat_mask = Vec::with_capacity(rows.len() * seq);
    for (ids, mask) in rows {
        let pad = seq - ids.len();
        flat_ids.extend(ids.into_iter().chain(std::iter::repeat(PAD_ID).take(pad)));
        flat_mask.extend(mask.into_iter().chain(std::iter::repeat(0).take(pad)));
    }
    let input_ids = Tensor::from_vec(flat_ids, (texts.len(), seq), device)?;
    let attention_mask = Tensor::from_vec(flat_mask, (texts.len(), seq), device)?;
    Ok((input_ids, attention_mask))
}
