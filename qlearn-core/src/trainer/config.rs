//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of episodes to run.
    pub max_episodes: usize,

    /// Episodes are cut off after this many environment steps.
    pub max_steps_per_episode: usize,

    /// Interval of saving model parameters in episodes. `0` disables saving.
    pub save_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<PathBuf>,

    /// Identifier of the saved model, giving `dqn_model_{model_id}.*`.
    pub model_id: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_episodes: 500,
            max_steps_per_episode: 1000,
            save_interval: 0,
            model_dir: None,
            model_id: "0".to_string(),
        }
    }
}

impl TrainerConfig {
    /// Sets the number of episodes.
    pub fn max_episodes(mut self, v: usize) -> Self {
        self.max_episodes = v;
        self
    }

    /// Sets the step limit of an episode.
    pub fn max_steps_per_episode(mut self, v: usize) -> Self {
        self.max_steps_per_episode = v;
        self
    }

    /// Sets the interval of saving in episodes.
    pub fn save_interval(mut self, v: usize) -> Self {
        self.save_interval = v;
        self
    }

    /// Sets the directory where the model is saved.
    pub fn model_dir(mut self, v: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(v.into());
        self
    }

    /// Sets the identifier of the saved model.
    pub fn model_id(mut self, v: impl Into<String>) -> Self {
        self.model_id = v.into();
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of trainer from {:?}", path_);
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of trainer into {:?}", path_);
        Ok(())
    }
}
