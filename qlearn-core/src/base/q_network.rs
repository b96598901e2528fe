//! Action-value approximator.
use anyhow::Result;
use ndarray::{Array2, ArrayD};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Debug, path::Path};

/// Dimensions and learning rate an approximator is built for.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelSpec {
    /// Shape of one observation, without the batch axis.
    pub state_shape: Vec<usize>,

    /// Number of discrete actions, i.e. the output dimension.
    pub n_actions: usize,

    /// Learning rate of the optimizer.
    pub learning_rate: f64,
}

impl ModelSpec {
    /// Number of scalars in one observation.
    pub fn in_dim(&self) -> usize {
        self.state_shape.iter().product()
    }
}

/// A parametric function from a batch of states to per-action values,
/// together with its loss and optimizer.
///
/// The learning core only evaluates it and asks it to regress the value of
/// taken actions towards TD targets, so any function approximator works, from
/// [`LinearQ`](crate::LinearQ) to a neural network on a GPU.
pub trait QNetwork {
    /// Configuration from which the approximator is constructed.
    type Config: Clone + Debug + Serialize + DeserializeOwned;

    /// Extension of parameter files written by [`QNetwork::save`].
    const FILE_EXTENSION: &'static str;

    /// Builds the approximator.
    fn build(config: Self::Config, spec: &ModelSpec) -> Result<Self>
    where
        Self: Sized;

    /// Number of actions, the width of the output of [`QNetwork::forward`].
    fn n_actions(&self) -> usize;

    /// Evaluates a batch of states of shape `[batch, state_shape..]` and
    /// returns action values of shape `[batch, n_actions]`.
    fn forward(&self, states: &ArrayD<f32>) -> Result<Array2<f32>>;

    /// Performs one optimization step.
    ///
    /// Computes `Q(states)` gathered at `actions`, the loss against `targets`,
    /// backpropagates and updates the parameters in place. Returns the loss.
    fn backward_step(
        &mut self,
        states: &ArrayD<f32>,
        actions: &[usize],
        targets: &[f32],
    ) -> Result<f32>;

    /// Saves the parameters to a file.
    fn save(&self, path: &Path) -> Result<()>;

    /// Loads the parameters from a file.
    fn load(&mut self, path: &Path) -> Result<()>;
}
