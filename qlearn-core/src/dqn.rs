//! DQN agent.
mod base;
mod config;
mod target;
pub use base::{Dqn, OptStats, Phase};
pub use config::DqnConfig;
pub use target::{gather, td_targets};
