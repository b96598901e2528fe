use super::CandleQNetConfig;
use crate::{
    mlp::{Mlp, MlpConfig},
    opt::Optimizer,
    util::{batch_to_tensor, smooth_l1_loss, tensor_to_array2, CriticLoss},
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{loss::mse, Module, VarBuilder, VarMap};
use log::{info, trace};
use ndarray::{Array2, ArrayD};
use qlearn_core::{error::QlearnError, ModelSpec, QNetwork};
use std::path::Path;

/// Action-value function represented by an [`Mlp`], with its optimizer.
///
/// Parameters are kept in a [`VarMap`] and saved in safetensors format.
pub struct CandleQNet {
    device: Device,
    varmap: VarMap,
    n_actions: usize,
    critic_loss: CriticLoss,
    q: Mlp,
    opt: Optimizer,
}

impl CandleQNet {
    /// Returns the variables of the network.
    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    fn loss(&self, pred: &Tensor, tgt: &Tensor) -> Result<Tensor> {
        let loss = match self.critic_loss {
            CriticLoss::Mse => mse(pred, tgt)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(pred, tgt)?,
        };
        Ok(loss)
    }
}

impl QNetwork for CandleQNet {
    type Config = CandleQNetConfig;
    const FILE_EXTENSION: &'static str = "safetensors";

    fn build(config: Self::Config, spec: &ModelSpec) -> Result<Self> {
        let device: Device = config.device.try_into()?;
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Mlp::build(vb, MlpConfig::new(spec.in_dim(), config.units, spec.n_actions))?
        };
        let opt = config
            .opt_config
            .learning_rate(spec.learning_rate)
            .build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            n_actions: spec.n_actions,
            critic_loss: config.critic_loss,
            q,
            opt,
        })
    }

    fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn forward(&self, states: &ArrayD<f32>) -> Result<Array2<f32>> {
        let xs = batch_to_tensor(states, &self.device)?;
        let q = self.q.forward(&xs)?;
        tensor_to_array2(&q)
    }

    fn backward_step(
        &mut self,
        states: &ArrayD<f32>,
        actions: &[usize],
        targets: &[f32],
    ) -> Result<f32> {
        let n = actions.len();
        if let Some(&a) = actions.iter().find(|&&a| a >= self.n_actions) {
            return Err(QlearnError::ActionOutOfRange {
                action: a,
                n_actions: self.n_actions,
            }
            .into());
        }

        let xs = batch_to_tensor(states, &self.device)?;
        let act = {
            let act = actions.iter().map(|&a| a as u32).collect::<Vec<_>>();
            Tensor::from_vec(act, (n, 1), &self.device)?
        };
        let tgt = Tensor::from_slice(targets, (n,), &self.device)?;

        let pred = self.q.forward(&xs)?.gather(&act, D::Minus1)?.squeeze(D::Minus1)?;
        let loss = self.loss(&pred, &tgt)?;
        self.opt.backward_step(&loss)?;

        let loss = loss.to_scalar::<f32>()?;
        trace!("loss={}", loss);
        Ok(loss)
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.varmap.save(path)?;
        info!("Save Q-network to {:?}", path);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        self.varmap.load(path)?;
        info!("Load Q-network from {:?}", path);
        Ok(())
    }
}
