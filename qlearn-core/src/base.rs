//! Interfaces at the boundaries of the learning core.
mod env;
mod q_network;
pub use env::{Env, Step};
pub use q_network::{ModelSpec, QNetwork};
