use anyhow::{Result, bail};
use candle_core::Tensor;

/// Mean of the token states selected by `attention_mask`, scaled to unit
/// length. `hidden` is `[batch, seq, hidden]`, the mask `[batch, seq]`;
/// the result is `[batch, hidden]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, _seq, width) = hidden.dims3()?;
    if attention_mask.dims2()?.0 != batch { bail!("mask batch does not match hidden states"); }

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.affine(1.0, 1e-9)?;
    let mean = summed.broadcast_div(&counts)?;
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.affine(1.0, 1e-12)?;
    let pooled = mean.broadcast_div(&norm)?;
    debug_assert_eq!(pooled.dims(), &[batch, width]);
    Ok(pooled)
}
