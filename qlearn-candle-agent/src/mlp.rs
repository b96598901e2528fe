//! Multilayer perceptron.
mod base;
mod config;
pub use base::Mlp;
use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module};
pub use config::MlpConfig;

fn mlp_forward(xs: Tensor, layers: &[Linear]) -> Result<Tensor> {
    let n_layers = layers.len();
    let mut xs = xs;

    for layer in &layers[..n_layers - 1] {
        xs = layer.forward(&xs)?.relu()?;
    }

    layers[n_layers - 1].forward(&xs)
}
