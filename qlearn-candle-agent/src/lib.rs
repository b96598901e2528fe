//! Action-value networks implemented with [candle](https://crates.io/crates/candle-core).
//!
//! [`CandleQNet`] implements [`QNetwork`](qlearn_core::QNetwork), so it can be
//! plugged into [`Dqn`](qlearn_core::Dqn):
//!
//! ```no_run
//! use qlearn_candle_agent::{CandleQNet, CandleQNetConfig};
//! use qlearn_core::{Dqn, DqnConfig};
//! # fn main() -> anyhow::Result<()> {
//! let config = DqnConfig::<CandleQNetConfig>::default()
//!     .state_shape(vec![4])
//!     .n_actions(2)
//!     .model_config(CandleQNetConfig::default().units(vec![64, 64]));
//! let agent: Dqn<CandleQNet> = Dqn::build(config)?;
//! # Ok(())
//! # }
//! ```
pub mod mlp;
pub mod opt;
mod qnet;
pub mod util;
use serde::{Deserialize, Serialize};
pub use qnet::{CandleQNet, CandleQNetConfig};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Default)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    #[default]
    Cpu,

    /// The GPU device with the given ordinal.
    Cuda(usize),
}

impl TryFrom<Device> for candle_core::Device {
    type Error = candle_core::Error;

    fn try_from(device: Device) -> Result<Self, Self::Error> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => candle_core::Device::new_cuda(n),
        }
    }
}
