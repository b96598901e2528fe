#![warn(missing_docs)]
//! Core of a deep Q-learning agent.
//!
//! The crate provides the pieces of a value-based agent for environments with
//! discrete actions:
//!
//! * [`ReplayMemory`], a fixed-capacity circular store of transitions with
//!   uniform sampling without replacement.
//! * [`EpsilonGreedy`], an explorer whose exploration probability decays
//!   linearly down to a floor.
//! * [`Dqn`], the agent. It selects actions, stores transitions and performs
//!   learning steps that regress `Q(s, a)` towards `r + gamma * max_a' Q(s', a')`.
//!
//! The action-value function is abstracted by [`QNetwork`]. [`LinearQ`] is a
//! linear implementation on top of `ndarray`; neural networks are provided by
//! other crates.
//!
//! ```rust
//! use ndarray::{arr1, ArrayD};
//! use qlearn_core::{Dqn, DqnConfig, LinearQ, LinearQConfig};
//! # fn main() -> anyhow::Result<()> {
//! let config = DqnConfig::<LinearQConfig>::default()
//!     .state_shape(vec![2])
//!     .n_actions(3)
//!     .batch_size(2);
//! let mut agent: Dqn<LinearQ> = Dqn::build(config)?;
//!
//! let s: ArrayD<f32> = arr1(&[0.0, 1.0]).into_dyn();
//! let a = agent.choose_action(&s)?;
//! agent.store_transition(&s, a, 1.0, &s, false)?;
//! assert!(agent.learn()?.is_none());
//!
//! agent.store_transition(&s, a, 0.0, &s, true)?;
//! assert!(agent.learn()?.is_some());
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod record;

mod base;
pub use base::{Env, ModelSpec, QNetwork, Step};

pub mod replay_memory;
pub use replay_memory::{ReplayMemory, Transition, TransitionBatch};

pub mod explorer;
pub use explorer::{argmax, softmax, EpsilonGreedy};

pub mod dqn;
pub use dqn::{gather, td_targets, Dqn, DqnConfig, OptStats, Phase};

mod linear;
pub use linear::{LinearQ, LinearQConfig};

mod trainer;
pub use trainer::{Trainer, TrainerConfig};
