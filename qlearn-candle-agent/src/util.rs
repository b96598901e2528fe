//! Utilities.
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use ndarray::{Array2, ArrayD};
use serde::{Deserialize, Serialize};

/// Critic loss type.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub enum CriticLoss {
    /// Mean squared error.
    #[default]
    Mse,

    /// Smooth L1 loss.
    SmoothL1,
}

/// Smooth L1 loss with threshold 1, averaged over all elements.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let device = x.device();
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?.to_device(device)?;
    let m2 = Tensor::try_from(1f32)?
        .to_device(device)?
        .broadcast_sub(&m1)?;
    (((0.5 * m1)? * d.powf(2.0))? + m2 * (d - 0.5))?.mean_all()
}

/// Converts a batch of observations into a tensor of shape `[batch, in_dim]`.
pub fn batch_to_tensor(xs: &ArrayD<f32>, device: &Device) -> Result<Tensor> {
    let shape = xs.shape().to_vec();
    let data = xs.iter().copied().collect::<Vec<_>>();
    let t = Tensor::from_vec(data, shape, device)?;
    match t.rank() {
        1 => Ok(t.unsqueeze(1)?),
        2 => Ok(t),
        _ => Ok(t.flatten_from(1)?),
    }
}

/// Converts a 2-dimensional tensor into [`Array2`].
pub fn tensor_to_array2(t: &Tensor) -> Result<Array2<f32>> {
    let (n, m) = t.dims2()?;
    let data = t
        .to_dtype(DType::F32)?
        .to_device(&Device::Cpu)?
        .flatten_all()?
        .to_vec1::<f32>()?;
    Ok(Array2::from_shape_vec((n, m), data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, IxDyn};

    #[test]
    fn test_smooth_l1_loss() -> Result<()> {
        let x = Tensor::from_slice(&[0.0f32, 0.0, 0.0], (3,), &Device::Cpu)?;
        let y = Tensor::from_slice(&[0.5f32, -2.0, 3.0], (3,), &Device::Cpu)?;
        let loss = smooth_l1_loss(&x, &y)?.to_scalar::<f32>()?;

        // 0.5 * 0.5^2, 2 - 0.5, 3 - 0.5
        let expected = (0.125 + 1.5 + 2.5) / 3.0;
        assert!((loss - expected).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_batch_conversion() -> Result<()> {
        let xs = ArrayD::from_shape_vec(IxDyn(&[2, 2, 2]), (0..8).map(|v| v as f32).collect())?;
        let t = batch_to_tensor(&xs, &Device::Cpu)?;
        assert_eq!(t.dims(), &[2, 4]);
        assert_eq!(
            tensor_to_array2(&t)?,
            array![[0.0, 1.0, 2.0, 3.0], [4.0, 5.0, 6.0, 7.0]]
        );
        Ok(())
    }
}
