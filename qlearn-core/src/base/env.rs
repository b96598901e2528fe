//! Environment.
use anyhow::Result;
use ndarray::ArrayD;

/// Outcome of one environment step: next observation, reward and terminal flag.
#[derive(Clone, Debug)]
pub struct Step {
    /// Observation after the action has been applied.
    pub obs: ArrayD<f32>,

    /// Reward for the transition.
    pub reward: f32,

    /// `true` if the episode ended with this step.
    pub is_done: bool,
}

impl Step {
    /// Constructs a [`Step`] object.
    pub fn new(obs: ArrayD<f32>, reward: f32, is_done: bool) -> Self {
        Self {
            obs,
            reward,
            is_done,
        }
    }
}

/// An episodic environment with a discrete action space.
///
/// The game producing states and rewards lives outside of this crate; the
/// [`Trainer`](crate::Trainer) only needs this interface.
pub trait Env {
    /// Number of discrete actions.
    fn n_actions(&self) -> usize;

    /// Shape of a single observation.
    fn state_shape(&self) -> Vec<usize>;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<ArrayD<f32>>;

    /// Applies `action` to the environment.
    fn step(&mut self, action: usize) -> Result<Step>;
}
