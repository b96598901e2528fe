//! Linear action-value function trained with stochastic gradient descent.
use crate::{error::QlearnError, ModelSpec, QNetwork};
use anyhow::Result;
use log::info;
use ndarray::{Array1, Array2, ArrayD};
use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// Configuration of [`LinearQ`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct LinearQConfig {
    /// Weights are drawn from `U(-init_scale, init_scale)`; biases start at zero.
    pub init_scale: f32,

    /// Seed of the weight initialization.
    pub seed: u64,
}

impl Default for LinearQConfig {
    fn default() -> Self {
        Self {
            init_scale: 0.01,
            seed: 0,
        }
    }
}

impl LinearQConfig {
    /// Sets the range of initial weights.
    pub fn init_scale(mut self, v: f32) -> Self {
        self.init_scale = v;
        self
    }

    /// Sets the seed of the weight initialization.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }
}

#[derive(Serialize, Deserialize)]
struct LinearQParams {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

/// `Q(s) = W s + b` with one row of `W` per action.
///
/// Observations are flattened. The loss is the mean squared error between
/// the values of the taken actions and the targets, minimized by plain SGD.
/// It has no hidden layers, which makes it a transparent stand-in for a
/// neural network.
pub struct LinearQ {
    in_dim: usize,
    lr: f32,
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl LinearQ {
    /// Weights, shape `[n_actions, in_dim]`.
    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// Biases, one per action.
    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    fn flatten(&self, states: &ArrayD<f32>) -> Result<Array2<f32>> {
        let batch_size = states.shape().first().copied().unwrap_or(0);
        if states.len() != batch_size * self.in_dim {
            return Err(QlearnError::ShapeMismatch {
                expected: vec![batch_size, self.in_dim],
                got: states.shape().to_vec(),
            }
            .into());
        }
        let xs = states
            .as_standard_layout()
            .into_owned()
            .into_shape((batch_size, self.in_dim))?;
        Ok(xs)
    }
}

impl QNetwork for LinearQ {
    type Config = LinearQConfig;
    const FILE_EXTENSION: &'static str = "bin";

    fn build(config: Self::Config, spec: &ModelSpec) -> Result<Self> {
        let in_dim = spec.in_dim();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let weights = if config.init_scale > 0.0 {
            let dist = Uniform::new_inclusive(-config.init_scale, config.init_scale);
            Array2::from_shape_simple_fn((spec.n_actions, in_dim), || rng.sample(dist))
        } else {
            Array2::zeros((spec.n_actions, in_dim))
        };

        Ok(Self {
            in_dim,
            lr: spec.learning_rate as f32,
            weights,
            bias: Array1::zeros(spec.n_actions),
        })
    }

    fn n_actions(&self) -> usize {
        self.weights.nrows()
    }

    fn forward(&self, states: &ArrayD<f32>) -> Result<Array2<f32>> {
        let xs = self.flatten(states)?;
        Ok(xs.dot(&self.weights.t()) + &self.bias)
    }

    fn backward_step(
        &mut self,
        states: &ArrayD<f32>,
        actions: &[usize],
        targets: &[f32],
    ) -> Result<f32> {
        let xs = self.flatten(states)?;
        if xs.nrows() != actions.len() || targets.len() != actions.len() {
            return Err(QlearnError::ShapeMismatch {
                expected: vec![xs.nrows(), xs.nrows()],
                got: vec![actions.len(), targets.len()],
            }
            .into());
        }
        let n_actions = self.n_actions();
        let n = actions.len() as f32;
        let mut grad_w = Array2::<f32>::zeros(self.weights.raw_dim());
        let mut grad_b = Array1::<f32>::zeros(n_actions);
        let mut loss = 0.0;

        for (i, (&a, &tgt)) in actions.iter().zip(targets.iter()).enumerate() {
            if a >= n_actions {
                return Err(QlearnError::ActionOutOfRange {
                    action: a,
                    n_actions,
                }
                .into());
            }
            let x = xs.row(i);
            let err = x.dot(&self.weights.row(a)) + self.bias[a] - tgt;
            loss += err * err / n;

            // d(mean sq err)/dq = 2 * err / n
            let g = 2.0 * err / n;
            grad_w.row_mut(a).scaled_add(g, &x);
            grad_b[a] += g;
        }

        self.weights.scaled_add(-self.lr, &grad_w);
        self.bias.scaled_add(-self.lr, &grad_b);

        Ok(loss)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let params = LinearQParams {
            weights: self.weights.clone(),
            bias: self.bias.clone(),
        };
        let file = BufWriter::new(File::create(path)?);
        bincode::serialize_into(file, &params)?;
        info!("Save linear model to {:?}", path);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let file = BufReader::new(File::open(path)?);
        let params: LinearQParams = bincode::deserialize_from(file)?;
        if params.weights.raw_dim() != self.weights.raw_dim()
            || params.bias.len() != self.bias.len()
        {
            return Err(QlearnError::ShapeMismatch {
                expected: self.weights.shape().to_vec(),
                got: params.weights.shape().to_vec(),
            }
            .into());
        }
        self.weights = params.weights;
        self.bias = params.bias;
        info!("Load linear model from {:?}", path);
        Ok(())
    }
}
