use anyhow::{ensure, Result};
use candle_core::Tensor;

/// Sentence-transformers pooling: mean over unmasked tokens, then L2 normalize.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]` (any numeric dtype).
/// Returns `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, time, hidden_dim) = hidden.dims3()?;
    ensure!(
        attention_mask.dims() == [batch, time],
        "attention mask shape {:?} does not match hidden states [{batch}, {time}, {hidden_dim}]",
        attention_mask.dims()
    );

    let mask = attention_mask
        .to_device(hidden.device())?
        .to_dtype(hidden.dtype())?
        .unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    // all-padding rows would divide by zero
    let counts = mask.sum(1)?.maximum(1e-9)?;
    let mean = summed.broadcast_div(&counts)?;
    let norm = mean.sqr()?.sum_keepdim(1)?.sqrt()?.maximum(1e-12)?;
    Ok(mean.broadcast_div(&norm)?)
}
