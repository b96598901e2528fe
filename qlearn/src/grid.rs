use anyhow::Result;
use log::{info, trace};
use ndarray::{Array2, ArrayD};
use qlearn_core::{error::QlearnError, Env, Step};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`GridWorld`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct GridConfig {
    /// Number of columns.
    pub width: usize,

    /// Number of rows.
    pub height: usize,

    /// Cells `(row, col)` ending the episode with `pit_reward`.
    pub pits: Vec<(usize, usize)>,

    /// Reward of every step not ending the episode.
    pub step_reward: f32,

    /// Reward for reaching the bottom-right corner.
    pub goal_reward: f32,

    /// Reward for falling into a pit.
    pub pit_reward: f32,

    /// If `true`, episodes start in a random free cell, otherwise top-left.
    pub random_start: bool,

    /// Seed of the random start positions.
    pub seed: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 5,
            height: 5,
            pits: vec![(1, 1), (2, 3), (3, 1)],
            step_reward: -0.01,
            goal_reward: 1.0,
            pit_reward: -1.0,
            random_start: false,
            seed: 0,
        }
    }
}

impl GridConfig {
    /// Sets the size of the grid.
    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the pits.
    pub fn pits(mut self, v: Vec<(usize, usize)>) -> Self {
        self.pits = v;
        self
    }

    /// Sets random start positions.
    pub fn random_start(mut self, v: bool) -> Self {
        self.random_start = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`GridConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of grid from {:?}", path_);
        Ok(b)
    }

    /// Saves [`GridConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of grid into {:?}", path_);
        Ok(())
    }
}

/// Moves on a rectangular grid from the start cell to the bottom-right
/// corner while avoiding pits.
///
/// Actions are `0: up`, `1: down`, `2: left` and `3: right`. Moves into a
/// wall leave the position unchanged. The observation is a `[height, width]`
/// array with `1.0` at the current position and zeros elsewhere.
pub struct GridWorld {
    config: GridConfig,
    pos: (usize, usize),
    rng: SmallRng,
}

impl GridWorld {
    /// Number of actions.
    pub const N_ACTIONS: usize = 4;

    /// Constructs the environment.
    pub fn build(config: GridConfig) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        Self {
            config,
            pos: (0, 0),
            rng,
        }
    }

    /// Current position `(row, col)`.
    pub fn pos(&self) -> (usize, usize) {
        self.pos
    }

    fn goal(&self) -> (usize, usize) {
        (self.config.height - 1, self.config.width - 1)
    }

    fn is_pit(&self, pos: (usize, usize)) -> bool {
        self.config.pits.contains(&pos)
    }

    fn obs(&self) -> ArrayD<f32> {
        let mut obs = Array2::zeros((self.config.height, self.config.width));
        obs[self.pos] = 1.0;
        obs.into_dyn()
    }
}

impl Env for GridWorld {
    fn n_actions(&self) -> usize {
        Self::N_ACTIONS
    }

    fn state_shape(&self) -> Vec<usize> {
        vec![self.config.height, self.config.width]
    }

    fn reset(&mut self) -> Result<ArrayD<f32>> {
        self.pos = if self.config.random_start {
            loop {
                let pos = (
                    self.rng.gen_range(0..self.config.height),
                    self.rng.gen_range(0..self.config.width),
                );
                if !self.is_pit(pos) && pos != self.goal() {
                    break pos;
                }
            }
        } else {
            (0, 0)
        };
        Ok(self.obs())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        let (r, c) = self.pos;
        self.pos = match action {
            0 => (r.saturating_sub(1), c),
            1 => ((r + 1).min(self.config.height - 1), c),
            2 => (r, c.saturating_sub(1)),
            3 => (r, (c + 1).min(self.config.width - 1)),
            _ => {
                return Err(QlearnError::ActionOutOfRange {
                    action,
                    n_actions: Self::N_ACTIONS,
                }
                .into())
            }
        };
        trace!("action={}, pos={:?}", action, self.pos);

        let (reward, is_done) = if self.pos == self.goal() {
            (self.config.goal_reward, true)
        } else if self.is_pit(self.pos) {
            (self.config.pit_reward, true)
        } else {
            (self.config.step_reward, false)
        };

        Ok(Step::new(self.obs(), reward, is_done))
    }
}
