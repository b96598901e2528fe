use super::{mlp_forward, MlpConfig};
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{linear, Linear, Module, VarBuilder};

/// Returns vector of linear modules from [`MlpConfig`].
fn create_linear_layers(prefix: &str, vs: VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let vs = vs.pp(prefix);

    config
        .in_out_pairs()
        .iter()
        .enumerate()
        .map(|(i, &(in_dim, out_dim))| Ok(linear(in_dim, out_dim, vs.pp(format!("ln{}", i)))?))
        .collect()
}

/// Multilayer perceptron with ReLU activation function.
///
/// No activation is applied to the output layer, so outputs can be used as
/// action values directly.
pub struct Mlp {
    config: MlpConfig,
    device: Device,
    layers: Vec<Linear>,
}

impl Mlp {
    /// Creates the layers in `vs` under the prefix `mlp`.
    pub fn build(vs: VarBuilder, config: MlpConfig) -> Result<Self> {
        let device = vs.device().clone();
        let layers = create_linear_layers("mlp", vs, &config)?;

        Ok(Self {
            config,
            device,
            layers,
        })
    }

    /// Configuration of the network.
    pub fn config(&self) -> &MlpConfig {
        &self.config
    }
}

impl Module for Mlp {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        mlp_forward(xs, &self.layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_mlp_layers_and_shape() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = Mlp::build(vb, MlpConfig::new(6, vec![16, 8], 3))?;

        // Weights and biases of three layers.
        assert_eq!(varmap.all_vars().len(), 6);

        let xs = Tensor::zeros((5, 6), DType::F32, &Device::Cpu)?;
        assert_eq!(mlp.forward(&xs)?.dims(), &[5, 3]);
        Ok(())
    }

    #[test]
    fn test_mlp_without_hidden_layers() -> Result<()> {
        let config = MlpConfig::new(4, vec![], 2);
        assert_eq!(config.in_out_pairs(), vec![(4, 2)]);

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let mlp = Mlp::build(vb, config)?;
        let xs = Tensor::ones((1, 4), DType::F32, &Device::Cpu)?;
        assert_eq!(mlp.forward(&xs)?.dims(), &[1, 2]);
        Ok(())
    }
}
