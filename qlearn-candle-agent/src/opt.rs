//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training the action-value network.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        #[serde(default = "default_beta1")]
        beta1: f64,
        /// Decay rate of the second moment.
        #[serde(default = "default_beta2")]
        beta2: f64,
        /// Term added to the denominator for numerical stability.
        #[serde(default = "default_eps")]
        eps: f64,
        /// Decoupled weight decay.
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl OptimizerConfig {
    /// Constructs the optimizer over `vars`.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                let params = ParamsAdamW {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                    weight_decay: *weight_decay,
                };
                let opt = AdamW::new(vars, params)?;
                Ok(Optimizer::AdamW(opt))
            }
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
        }
    }

    /// Overrides the learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::AdamW {
                lr: _,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam { lr: _ } => Self::Adam { lr },
        }
    }

    /// Returns the learning rate.
    pub fn get_learning_rate(&self) -> f64 {
        match self {
            Self::AdamW { lr, .. } => *lr,
            Self::Adam { lr } => *lr,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 1e-3 }
    }
}

/// Optimizers.
///
/// This is a thin wrapper of [`candle_nn::Optimizer`] implementations.
pub enum Optimizer {
    /// AdamW optimizer.
    AdamW(AdamW),

    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Computes gradients of `loss` and updates the parameters.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::AdamW(opt) => Ok(opt.backward_step(loss)?),
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learning_rate_override() {
        let config = OptimizerConfig::default().learning_rate(0.5);
        assert_eq!(config, OptimizerConfig::Adam { lr: 0.5 });

        let config = OptimizerConfig::AdamW {
            lr: 1e-3,
            beta1: 0.8,
            beta2: 0.9,
            eps: 1e-6,
            weight_decay: 0.0,
        }
        .learning_rate(0.1);
        assert_eq!(config.get_learning_rate(), 0.1);
        match config {
            OptimizerConfig::AdamW { beta1, .. } => assert_eq!(beta1, 0.8),
            _ => panic!("optimizer kind changed"),
        }
    }

    #[test]
    fn test_adamw_defaults_from_yaml() -> anyhow::Result<()> {
        let config: OptimizerConfig = serde_yaml::from_str("AdamW:\n  lr: 0.01\n")?;
        match config {
            OptimizerConfig::AdamW {
                lr, weight_decay, ..
            } => {
                assert_eq!(lr, 0.01);
                assert_eq!(weight_decay, ParamsAdamW::default().weight_decay);
            }
            _ => panic!("expected AdamW"),
        }
        Ok(())
    }
}
