//! Configuration of DQN agent.
use crate::{EpsilonGreedy, ModelSpec};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn).
///
/// `C` is the configuration of the approximator. Nothing here is validated;
/// `batch_size` must not exceed `memory_capacity` and `epsilon_decay` should
/// be non-negative.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<C> {
    /// Discount factor of future rewards.
    pub gamma: f64,

    /// Initial exploration probability.
    pub epsilon: f64,

    /// Floor of the exploration probability.
    pub epsilon_min: f64,

    /// Linear decrement of epsilon per learning step.
    pub epsilon_decay: f64,

    /// Learning rate handed to the approximator.
    pub learning_rate: f64,

    /// Shape of one observation.
    pub state_shape: Vec<usize>,

    /// Number of transitions per learning step.
    pub batch_size: usize,

    /// Number of discrete actions.
    pub n_actions: usize,

    /// Capacity of the replay memory.
    pub memory_capacity: usize,

    /// Seed of the random number generator shared by exploration and sampling.
    pub seed: u64,

    /// Configuration of the approximator.
    pub model_config: C,
}

impl<C: Default> Default for DqnConfig<C> {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            epsilon: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 5e-4,
            learning_rate: 1e-3,
            state_shape: vec![1],
            batch_size: 64,
            n_actions: 2,
            memory_capacity: 100_000,
            seed: 42,
            model_config: C::default(),
        }
    }
}

impl<C> DqnConfig<C> {
    /// Discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Initial exploration probability.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Floor of the exploration probability.
    pub fn epsilon_min(mut self, v: f64) -> Self {
        self.epsilon_min = v;
        self
    }

    /// Decrement of epsilon per learning step.
    pub fn epsilon_decay(mut self, v: f64) -> Self {
        self.epsilon_decay = v;
        self
    }

    /// Learning rate.
    pub fn learning_rate(mut self, v: f64) -> Self {
        self.learning_rate = v;
        self
    }

    /// Shape of one observation.
    pub fn state_shape(mut self, v: Vec<usize>) -> Self {
        self.state_shape = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Number of actions.
    pub fn n_actions(mut self, v: usize) -> Self {
        self.n_actions = v;
        self
    }

    /// Capacity of the replay memory.
    pub fn memory_capacity(mut self, v: usize) -> Self {
        self.memory_capacity = v;
        self
    }

    /// Random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Sets the configuration of the approximator.
    pub fn model_config(mut self, v: C) -> Self {
        self.model_config = v;
        self
    }

    /// Explorer with the configured epsilon schedule.
    pub fn explorer(&self) -> EpsilonGreedy {
        EpsilonGreedy::new(self.epsilon, self.epsilon_min, self.epsilon_decay)
    }

    /// Dimensions the approximator is built for.
    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec {
            state_shape: self.state_shape.clone(),
            n_actions: self.n_actions,
            learning_rate: self.learning_rate,
        }
    }
}

impl<C> DqnConfig<C>
where
    C: Serialize + DeserializeOwned,
{
    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DqnConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN agent into {:?}", path_);
        Ok(())
    }
}
