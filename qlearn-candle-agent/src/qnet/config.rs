use crate::{opt::OptimizerConfig, util::CriticLoss, Device};
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`CandleQNet`](super::CandleQNet).
///
/// Input and output dimensions are taken from the
/// [`ModelSpec`](qlearn_core::ModelSpec) the network is built for. So is the
/// learning rate, which overrides the one in `opt_config`.
pub struct CandleQNetConfig {
    /// Sizes of the hidden layers.
    pub units: Vec<usize>,

    /// Optimizer.
    pub opt_config: OptimizerConfig,

    /// Loss between predicted action values and TD targets.
    pub critic_loss: CriticLoss,

    /// Device on which the parameters live.
    pub device: Device,
}

impl Default for CandleQNetConfig {
    fn default() -> Self {
        Self {
            units: vec![256, 256],
            opt_config: OptimizerConfig::default(),
            critic_loss: CriticLoss::Mse,
            device: Device::Cpu,
        }
    }
}

impl CandleQNetConfig {
    /// Sets the sizes of the hidden layers.
    pub fn units(mut self, v: Vec<usize>) -> Self {
        self.units = v;
        self
    }

    /// Sets optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.opt_config = v;
        self
    }

    /// Sets the critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Constructs [`CandleQNetConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of Q-network from {:?}", path_);
        Ok(b)
    }

    /// Saves [`CandleQNetConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of Q-network into {:?}", path_);
        Ok(())
    }
}
