//! Train [`Dqn`] agents on an [`Env`].
mod config;
use crate::{
    record::{Record, RecordValue, Recorder},
    Dqn, Env, QNetwork,
};
use anyhow::Result;
use chrono::Local;
use log::info;
pub use config::TrainerConfig;
use rand::Rng;

/// Runs the control loop around a [`Dqn`] agent.
///
/// # Training loop
///
/// For every episode:
///
/// 1. Reset [`Env`] and take its observation `o_t`.
/// 2. Choose an action `a_t` with [`Dqn::choose_action`] and step the
///    environment, which gives `o_t+1`, the reward and the terminal flag.
/// 3. Store the transition with [`Dqn::store_transition`] and call
///    [`Dqn::learn`] once. During warm-up the learning step is a no-op.
/// 4. Repeat from 2 until the episode is done or `max_steps_per_episode`
///    steps have been taken. A cut-off episode does not mark its last
///    transition as terminal.
/// 5. Write a record with `episode`, `return`, `length`, `epsilon`,
///    `opt_steps`, the mean `loss` of the episode (if any update happened)
///    and a `datetime`.
/// 6. If `save_interval > 0` and the episode number is a multiple of it,
///    save the model as `(model_dir)/dqn_model_(model_id).*`.
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Runs one episode and returns its record.
    pub fn run_episode<Q, R, E>(&self, agent: &mut Dqn<Q, R>, env: &mut E) -> Result<Record>
    where
        Q: QNetwork,
        R: Rng,
        E: Env,
    {
        let mut obs = env.reset()?;
        let mut ret = 0f32;
        let mut len = 0usize;
        let mut loss_sum = 0f32;
        let mut n_updates = 0usize;

        while len < self.config.max_steps_per_episode {
            let act = agent.choose_action(&obs)?;
            let step = env.step(act)?;
            agent.store_transition(&obs, act, step.reward, &step.obs, step.is_done)?;
            if let Some(stats) = agent.learn()? {
                loss_sum += stats.loss;
                n_updates += 1;
            }

            ret += step.reward;
            len += 1;
            obs = step.obs;
            if step.is_done {
                break;
            }
        }

        let mut record = Record::from_slice(&[
            ("return", RecordValue::Scalar(ret)),
            ("length", RecordValue::Scalar(len as f32)),
            ("epsilon", RecordValue::Scalar(agent.epsilon() as f32)),
            ("opt_steps", RecordValue::Scalar(agent.n_opts() as f32)),
        ]);
        if n_updates > 0 {
            record.insert("loss", RecordValue::Scalar(loss_sum / n_updates as f32));
        }
        Ok(record)
    }

    /// Trains the agent for `max_episodes` episodes.
    pub fn train<Q, R, E>(
        &self,
        agent: &mut Dqn<Q, R>,
        env: &mut E,
        recorder: &mut dyn Recorder,
    ) -> Result<()>
    where
        Q: QNetwork,
        R: Rng,
        E: Env,
    {
        for episode in 1..=self.config.max_episodes {
            let mut record = self.run_episode(agent, env)?;
            record.insert("episode", RecordValue::Scalar(episode as f32));
            record.insert("datetime", RecordValue::DateTime(Local::now()));
            recorder.write(record);

            if self.config.save_interval > 0 && episode % self.config.save_interval == 0 {
                self.save_model(agent)?;
            }
        }
        info!("Finished training after {} episodes", self.config.max_episodes);

        Ok(())
    }

    fn save_model<Q, R>(&self, agent: &Dqn<Q, R>) -> Result<()>
    where
        Q: QNetwork,
        R: Rng,
    {
        match &self.config.model_dir {
            Some(dir) => {
                agent.save_model(&self.config.model_id, dir)?;
            }
            None => info!("model_dir is not set; skip saving the model"),
        }
        Ok(())
    }
}
