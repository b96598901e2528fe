//! DQN agent.
use super::{gather, td_targets, DqnConfig};
use crate::{
    error::QlearnError,
    record::{Record, RecordValue},
    EpsilonGreedy, QNetwork, ReplayMemory,
};
use anyhow::Result;
use log::{debug, info};
use ndarray::{ArrayD, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Learning phase of the agent.
///
/// The agent leaves [`Phase::WarmingUp`] once the memory holds a full batch
/// and never goes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fewer transitions than `batch_size` are stored; learning is a no-op.
    WarmingUp,

    /// Every call to [`Dqn::learn`] performs an update.
    Learning,
}

/// Outcome of one learning step.
#[derive(Debug, Clone, PartialEq)]
pub struct OptStats {
    /// Sampled slots of the replay memory.
    pub ixs: Vec<usize>,

    /// TD targets of the sampled transitions.
    pub targets: Vec<f32>,

    /// Action values of the taken actions before the update.
    pub estimates: Vec<f32>,

    /// Loss returned by the approximator.
    pub loss: f32,

    /// Exploration probability after decay.
    pub epsilon: f64,
}

impl OptStats {
    /// Converts the statistics into a [`Record`].
    pub fn to_record(&self) -> Record {
        let n = self.estimates.len().max(1) as f32;
        Record::from_slice(&[
            ("loss", RecordValue::Scalar(self.loss)),
            ("epsilon", RecordValue::Scalar(self.epsilon as f32)),
            ("q_mean", RecordValue::Scalar(self.estimates.iter().sum::<f32>() / n)),
            ("target_mean", RecordValue::Scalar(self.targets.iter().sum::<f32>() / n)),
            ("targets", RecordValue::Array1(self.targets.clone())),
        ])
    }
}

/// Deep Q-learning agent.
///
/// Owns the approximator `Q`, the replay memory, the epsilon-greedy explorer
/// and the random number generator `R` used for both exploration and batch
/// sampling. A control loop drives it with [`Dqn::choose_action`],
/// [`Dqn::store_transition`] and [`Dqn::learn`].
pub struct Dqn<Q, R = StdRng>
where
    Q: QNetwork,
    R: Rng,
{
    qnet: Q,
    memory: ReplayMemory,
    explorer: EpsilonGreedy,
    gamma: f64,
    batch_size: usize,
    n_actions: usize,
    n_opts: usize,
    rng: R,
}

impl<Q, R> Dqn<Q, R>
where
    Q: QNetwork,
    R: Rng + SeedableRng,
{
    /// Builds the approximator from `config.model_config` and seeds the
    /// random number generator with `config.seed`.
    pub fn build(config: DqnConfig<Q::Config>) -> Result<Self> {
        let qnet = Q::build(config.model_config.clone(), &config.model_spec())?;
        let rng = R::seed_from_u64(config.seed);
        Ok(Self::from_parts(&config, qnet, rng))
    }
}

impl<Q, R> Dqn<Q, R>
where
    Q: QNetwork,
    R: Rng,
{
    /// Constructs the agent around an existing approximator and random number
    /// generator. `config.model_config` and `config.seed` are not used.
    pub fn from_parts<C>(config: &DqnConfig<C>, qnet: Q, rng: R) -> Self {
        Self {
            qnet,
            memory: ReplayMemory::new(config.memory_capacity, config.state_shape.clone()),
            explorer: config.explorer(),
            gamma: config.gamma,
            batch_size: config.batch_size,
            n_actions: config.n_actions,
            n_opts: 0,
            rng,
        }
    }

    /// Stores a transition in the replay memory.
    pub fn store_transition(
        &mut self,
        state: &ArrayD<f32>,
        action: usize,
        reward: f32,
        next_state: &ArrayD<f32>,
        done: bool,
    ) -> Result<()> {
        if action >= self.n_actions {
            return Err(QlearnError::ActionOutOfRange {
                action,
                n_actions: self.n_actions,
            }
            .into());
        }
        self.memory.store(state, action, reward, next_state, done)?;
        Ok(())
    }

    /// Epsilon-greedy action for a single observation.
    pub fn choose_action(&mut self, obs: &ArrayD<f32>) -> Result<usize> {
        let n_actions = self.n_actions;
        let qnet = &self.qnet;
        self.explorer.select(n_actions, &mut self.rng, || {
            let q = qnet.forward(&obs.clone().insert_axis(Axis(0)))?;
            if q.shape() != &[1, n_actions] {
                return Err(QlearnError::ShapeMismatch {
                    expected: vec![1, n_actions],
                    got: q.shape().to_vec(),
                }
                .into());
            }
            Ok(q.index_axis_move(Axis(0), 0))
        })
    }

    /// Performs a learning step.
    ///
    /// Returns `Ok(None)` without touching anything while fewer than
    /// `batch_size` transitions have been stored. Otherwise samples a batch,
    /// regresses `Q(s, a)` towards `r + gamma * max_a' Q(s', a')`, with the
    /// bootstrap term dropped for terminal transitions, and decays epsilon.
    ///
    /// Fails with [`QlearnError::NonFiniteValue`] when a target is NaN or
    /// infinite; the approximator and epsilon are left untouched then.
    pub fn learn(&mut self) -> Result<Option<OptStats>> {
        if self.memory.count() < self.batch_size {
            return Ok(None);
        }

        let batch = self.memory.sample(self.batch_size, &mut self.rng)?;
        let estimates = {
            let q = self.qnet.forward(&batch.states)?;
            gather(&q, &batch.actions)?
        };
        let targets = {
            let q_next = self.qnet.forward(&batch.next_states)?;
            td_targets(&batch.rewards, &q_next, &batch.terminals, self.gamma)
        };
        if let Some(index) = targets.iter().position(|t| !t.is_finite()) {
            return Err(QlearnError::NonFiniteValue { index }.into());
        }

        let loss = self
            .qnet
            .backward_step(&batch.states, &batch.actions, &targets)?;

        self.explorer.decay();
        self.n_opts += 1;
        debug!(
            "opt {}: loss={:.6}, epsilon={:.4}",
            self.n_opts, loss, self.explorer.epsilon
        );

        Ok(Some(OptStats {
            ixs: batch.ixs,
            targets,
            estimates,
            loss,
            epsilon: self.explorer.epsilon,
        }))
    }

    /// Performs a learning step and returns its statistics as a [`Record`].
    pub fn opt_with_record(&mut self) -> Result<Option<Record>> {
        Ok(self.learn()?.map(|stats| stats.to_record()))
    }

    /// Current learning phase.
    pub fn phase(&self) -> Phase {
        if self.memory.count() < self.batch_size {
            Phase::WarmingUp
        } else {
            Phase::Learning
        }
    }

    /// Current exploration probability.
    pub fn epsilon(&self) -> f64 {
        self.explorer.epsilon
    }

    /// Number of learning steps performed.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Number of actions.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// The replay memory.
    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    /// The approximator.
    pub fn qnet(&self) -> &Q {
        &self.qnet
    }

    fn model_path(id: &str, dir: &Path) -> PathBuf {
        dir.join(format!("dqn_model_{}.{}", id, Q::FILE_EXTENSION))
    }

    /// Saves the approximator parameters as `dir/dqn_model_{id}.{ext}`.
    ///
    /// The replay memory and epsilon are not saved; an agent restored with
    /// [`Dqn::load_model`] starts exploring again with an empty memory.
    pub fn save_model(&self, id: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(&dir)?;
        let path = Self::model_path(id, dir.as_ref());
        self.qnet.save(&path)?;
        info!("Saved the model in {:?}", path);
        Ok(path)
    }

    /// Loads approximator parameters saved by [`Dqn::save_model`].
    pub fn load_model(&mut self, id: &str, dir: impl AsRef<Path>) -> Result<()> {
        let path = Self::model_path(id, dir.as_ref());
        self.qnet.load(&path)?;
        info!("Loaded the model from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinearQ, LinearQConfig, ModelSpec};
    use ndarray::{Array2, IxDyn};
    use serde::{Deserialize, Serialize};

    /// Returns fixed action values and remembers what it was asked to fit.
    struct FixedQ {
        values: Vec<f32>,
        fitted: Vec<(Vec<usize>, Vec<f32>)>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    struct FixedQConfig {
        values: Vec<f32>,
    }

    impl QNetwork for FixedQ {
        type Config = FixedQConfig;
        const FILE_EXTENSION: &'static str = "fixed";

        fn build(config: Self::Config, _spec: &ModelSpec) -> Result<Self> {
            Ok(Self {
                values: config.values,
                fitted: vec![],
            })
        }

        fn n_actions(&self) -> usize {
            self.values.len()
        }

        fn forward(&self, states: &ArrayD<f32>) -> Result<Array2<f32>> {
            let n = states.shape()[0];
            let data = (0..n).flat_map(|_| self.values.clone()).collect();
            Ok(Array2::from_shape_vec((n, self.values.len()), data)?)
        }

        fn backward_step(
            &mut self,
            _states: &ArrayD<f32>,
            actions: &[usize],
            targets: &[f32],
        ) -> Result<f32> {
            self.fitted.push((actions.to_vec(), targets.to_vec()));
            Ok(0.0)
        }

        fn save(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn load(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn obs(v: f32) -> ArrayD<f32> {
        ArrayD::from_elem(IxDyn(&[2]), v)
    }

    fn config() -> DqnConfig<LinearQConfig> {
        DqnConfig::default()
            .state_shape(vec![2])
            .n_actions(3)
            .batch_size(4)
            .memory_capacity(8)
            .epsilon(0.5)
            .epsilon_min(0.2)
            .epsilon_decay(0.1)
            .learning_rate(0.05)
    }

    #[test]
    fn test_warmup_is_noop() -> Result<()> {
        let mut agent = Dqn::<LinearQ>::build(config())?;
        for t in 0..3 {
            agent.store_transition(&obs(t as f32), t % 3, 1.0, &obs(0.0), false)?;
        }
        let weights = agent.qnet().weights().clone();
        let bias = agent.qnet().bias().clone();

        assert_eq!(agent.phase(), Phase::WarmingUp);
        assert!(agent.learn()?.is_none());
        assert!(agent.opt_with_record()?.is_none());
        assert_eq!(agent.qnet().weights(), &weights);
        assert_eq!(agent.qnet().bias(), &bias);
        assert_eq!(agent.epsilon(), 0.5);
        assert_eq!(agent.n_opts(), 0);

        agent.store_transition(&obs(3.0), 0, 1.0, &obs(0.0), false)?;
        assert_eq!(agent.phase(), Phase::Learning);
        assert!(agent.learn()?.is_some());
        assert_ne!(agent.qnet().weights(), &weights);
        Ok(())
    }

    #[test]
    fn test_epsilon_decays_to_floor() -> Result<()> {
        let mut agent = Dqn::<LinearQ>::build(config())?;
        for t in 0..4 {
            agent.store_transition(&obs(t as f32), 1, 0.5, &obs(1.0), t == 3)?;
        }

        let mut prev = agent.epsilon();
        for _ in 0..6 {
            let stats = agent.learn()?.unwrap();
            assert!(stats.epsilon <= prev);
            assert!(stats.epsilon >= 0.2);
            assert_eq!(stats.epsilon, agent.epsilon());
            prev = stats.epsilon;
        }
        assert!((agent.epsilon() - 0.2).abs() < 1e-12);
        assert_eq!(agent.n_opts(), 6);
        Ok(())
    }

    #[test]
    fn test_learner_targets_and_estimates() -> Result<()> {
        let config = DqnConfig::<FixedQConfig>::default()
            .state_shape(vec![2])
            .n_actions(3)
            .batch_size(4)
            .memory_capacity(4)
            .gamma(0.5)
            .model_config(FixedQConfig {
                values: vec![1.0, 10.0, 2.0],
            });
        let mut agent = Dqn::<FixedQ>::build(config)?;
        for t in 0..4 {
            agent.store_transition(&obs(t as f32), t % 3, t as f32, &obs(0.0), t % 2 == 1)?;
        }

        let stats = agent.learn()?.unwrap();
        for (j, &ix) in stats.ixs.iter().enumerate() {
            let reward = ix as f32;
            let expected = if ix % 2 == 1 { reward } else { reward + 0.5 * 10.0 };
            assert_eq!(stats.targets[j], expected);
            assert_eq!(stats.estimates[j], [1.0, 10.0, 2.0][ix % 3]);
        }

        let fitted = &agent.qnet().fitted;
        assert_eq!(fitted.len(), 1);
        assert_eq!(fitted[0].1, stats.targets);
        let actions: Vec<_> = stats.ixs.iter().map(|ix| ix % 3).collect();
        assert_eq!(fitted[0].0, actions);
        Ok(())
    }

    #[test]
    fn test_learn_fails_on_nan_values() -> Result<()> {
        let config = DqnConfig::<FixedQConfig>::default()
            .state_shape(vec![2])
            .n_actions(2)
            .batch_size(2)
            .memory_capacity(2)
            .epsilon(0.5)
            .model_config(FixedQConfig {
                values: vec![f32::NAN, 5.0],
            });
        let mut agent = Dqn::<FixedQ>::build(config)?;
        agent.store_transition(&obs(0.0), 0, 1.0, &obs(1.0), false)?;
        agent.store_transition(&obs(1.0), 1, 1.0, &obs(2.0), false)?;

        let err = agent.learn().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QlearnError>(),
            Some(QlearnError::NonFiniteValue { .. })
        ));
        assert!(agent.qnet().fitted.is_empty());
        assert_eq!(agent.epsilon(), 0.5);
        assert_eq!(agent.n_opts(), 0);
        Ok(())
    }

    #[test]
    fn test_choose_action_greedy_and_valid() -> Result<()> {
        let config = DqnConfig::<FixedQConfig>::default()
            .state_shape(vec![2])
            .n_actions(3)
            .epsilon(0.0)
            .epsilon_min(0.0)
            .model_config(FixedQConfig {
                values: vec![1.0, 10.0, 10.0],
            });
        let mut agent = Dqn::<FixedQ>::build(config.clone())?;
        for t in 0..20 {
            assert_eq!(agent.choose_action(&obs(t as f32))?, 1);
        }

        let mut agent = Dqn::<FixedQ>::build(config.epsilon(1.0))?;
        for t in 0..100 {
            assert!(agent.choose_action(&obs(t as f32))? < 3);
        }
        Ok(())
    }

    #[test]
    fn test_choose_action_rejects_wrong_width() -> Result<()> {
        let config = DqnConfig::<FixedQConfig>::default()
            .state_shape(vec![2])
            .n_actions(3)
            .epsilon(0.0)
            .model_config(FixedQConfig {
                values: vec![1.0, 2.0],
            });
        let mut agent = Dqn::<FixedQ>::build(config)?;
        assert!(agent.choose_action(&obs(0.0)).is_err());
        Ok(())
    }

    #[test]
    fn test_store_rejects_invalid_action() -> Result<()> {
        let mut agent = Dqn::<LinearQ>::build(config())?;
        let err = agent
            .store_transition(&obs(0.0), 3, 1.0, &obs(0.0), false)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<QlearnError>(),
            Some(&QlearnError::ActionOutOfRange {
                action: 3,
                n_actions: 3
            })
        );
        assert_eq!(agent.memory().count(), 0);
        Ok(())
    }

    #[test]
    fn test_same_seed_same_samples() -> Result<()> {
        let run = || -> Result<Vec<usize>> {
            let mut agent = Dqn::<LinearQ>::build(config().epsilon(0.0))?;
            for t in 0..8 {
                agent.store_transition(&obs(t as f32), t % 3, 1.0, &obs(0.0), false)?;
            }
            let mut ixs = vec![];
            for _ in 0..5 {
                ixs.extend(agent.learn()?.unwrap().ixs);
            }
            Ok(ixs)
        };
        assert_eq!(run()?, run()?);
        Ok(())
    }
}
