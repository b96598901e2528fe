//! A grid game for training and evaluating deep Q-learning agents.
//!
//! The `qlearn-grid` binary trains [`Dqn`](qlearn_core::Dqn) agents on
//! [`GridWorld`], either with a linear action-value function or with an MLP
//! implemented in candle.
mod grid;
pub use grid::{GridConfig, GridWorld};
