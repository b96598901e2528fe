use anyhow::Result;
use clap::Parser;
use log::info;
use qlearn::{GridConfig, GridWorld};
use qlearn_candle_agent::{CandleQNet, CandleQNetConfig};
use qlearn_core::{
    record::LogRecorder, Dqn, DqnConfig, Env, LinearQ, LinearQConfig, QNetwork, Trainer,
    TrainerConfig,
};
use std::path::{Path, PathBuf};

const GAMMA: f64 = 0.95;
const BATCH_SIZE: usize = 64;
const MEMORY_CAPACITY: usize = 10_000;
const EPSILON_DECAY: f64 = 1e-3;
const LR_LINEAR: f64 = 0.05;
const LR_MLP: f64 = 1e-3;
const MAX_STEPS_PER_EPISODE: usize = 100;
const SAVE_INTERVAL: usize = 50;
const N_EPISODES_PER_EVAL: usize = 5;

#[derive(Parser, Debug)]
#[command(version, about = "Train a DQN agent on a grid game")]
struct Args {
    /// Trains the agent.
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluates the saved agent with a greedy policy.
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// Uses an MLP instead of a linear action-value function.
    #[arg(long, default_value_t = false)]
    mlp: bool,

    /// Number of training episodes.
    #[arg(long, default_value_t = 500)]
    episodes: usize,

    /// Directory of the saved model.
    #[arg(long, default_value = "./model/grid")]
    model_dir: PathBuf,

    /// Identifier of the saved model.
    #[arg(long, default_value = "grid")]
    model_id: String,

    /// YAML file with the configuration of the grid.
    #[arg(long)]
    grid_config: Option<PathBuf>,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn create_grid_config(args: &Args) -> Result<GridConfig> {
    match &args.grid_config {
        Some(path) => GridConfig::load(path),
        None => Ok(GridConfig::default().seed(args.seed)),
    }
}

fn create_agent_config<C: Default>(env: &GridWorld, args: &Args, lr: f64) -> DqnConfig<C> {
    DqnConfig::default()
        .state_shape(env.state_shape())
        .n_actions(env.n_actions())
        .gamma(GAMMA)
        .batch_size(BATCH_SIZE)
        .memory_capacity(MEMORY_CAPACITY)
        .epsilon_decay(EPSILON_DECAY)
        .learning_rate(lr)
        .seed(args.seed)
}

fn train<Q>(args: &Args, agent_config: DqnConfig<Q::Config>, grid_config: GridConfig) -> Result<()>
where
    Q: QNetwork,
{
    let mut env = GridWorld::build(grid_config.clone());
    let mut agent: Dqn<Q> = Dqn::build(agent_config.clone())?;
    let mut recorder = LogRecorder::new("grid");
    let trainer_config = TrainerConfig::default()
        .max_episodes(args.episodes)
        .max_steps_per_episode(MAX_STEPS_PER_EPISODE)
        .save_interval(SAVE_INTERVAL)
        .model_dir(&args.model_dir)
        .model_id(&args.model_id);

    std::fs::create_dir_all(&args.model_dir)?;
    agent_config.save(args.model_dir.join("agent.yaml"))?;
    grid_config.save(args.model_dir.join("grid.yaml"))?;
    trainer_config.save(args.model_dir.join("trainer.yaml"))?;

    Trainer::build(trainer_config).train(&mut agent, &mut env, &mut recorder)?;
    agent.save_model(&args.model_id, &args.model_dir)?;

    Ok(())
}

/// Runs greedy episodes with the saved model and returns the mean return.
fn eval<Q>(model_dir: &Path, model_id: &str, n_episodes: usize) -> Result<f32>
where
    Q: QNetwork,
{
    let agent_config: DqnConfig<Q::Config> = DqnConfig::load(model_dir.join("agent.yaml"))?;
    let grid_config = GridConfig::load(model_dir.join("grid.yaml"))?;
    let mut env = GridWorld::build(grid_config);
    let mut agent: Dqn<Q> = Dqn::build(agent_config.epsilon(0.0).epsilon_min(0.0))?;
    agent.load_model(model_id, model_dir)?;

    let mut sum = 0f32;
    for episode in 0..n_episodes {
        let mut obs = env.reset()?;
        let mut ret = 0f32;
        for _ in 0..MAX_STEPS_PER_EPISODE {
            let step = env.step(agent.choose_action(&obs)?)?;
            ret += step.reward;
            obs = step.obs;
            if step.is_done {
                break;
            }
        }
        info!("Episode {}: return = {}", episode, ret);
        sum += ret;
    }

    Ok(sum / n_episodes as f32)
}

fn run<Q>(args: &Args, agent_config: DqnConfig<Q::Config>, grid_config: GridConfig) -> Result<()>
where
    Q: QNetwork,
{
    if args.train || !args.eval {
        train::<Q>(args, agent_config, grid_config)?;
    }
    if args.eval || !args.train {
        let mean = eval::<Q>(&args.model_dir, &args.model_id, N_EPISODES_PER_EVAL)?;
        info!("Mean return of greedy episodes: {}", mean);
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let grid_config = create_grid_config(&args)?;
    let env = GridWorld::build(grid_config.clone());

    if args.mlp {
        let config = create_agent_config(&env, &args, LR_MLP)
            .model_config(CandleQNetConfig::default().units(vec![64, 64]));
        run::<CandleQNet>(&args, config, grid_config)
    } else {
        let config = create_agent_config(&env, &args, LR_LINEAR)
            .model_config(LinearQConfig::default().seed(args.seed));
        run::<LinearQ>(&args, config, grid_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn args(model_dir: &Path, mlp: bool) -> Args {
        Args {
            train: true,
            eval: false,
            mlp,
            episodes: 20,
            model_dir: model_dir.to_owned(),
            model_id: "test".to_string(),
            grid_config: None,
            seed: 0,
        }
    }

    #[test]
    fn test_train_and_eval_linear() -> Result<()> {
        let tmp_dir = TempDir::new("qlearn_grid")?;
        let args = args(tmp_dir.path(), false);
        let grid_config = create_grid_config(&args)?;
        let env = GridWorld::build(grid_config.clone());
        let config = create_agent_config::<LinearQConfig>(&env, &args, LR_LINEAR);

        train::<LinearQ>(&args, config, grid_config)?;
        assert!(tmp_dir.path().join("dqn_model_test.bin").exists());

        let mean = eval::<LinearQ>(tmp_dir.path(), "test", 2)?;
        assert!(mean.is_finite());
        Ok(())
    }

    #[test]
    fn test_train_and_eval_mlp() -> Result<()> {
        let tmp_dir = TempDir::new("qlearn_grid")?;
        let args = args(tmp_dir.path(), true);
        let grid_config = create_grid_config(&args)?;
        let env = GridWorld::build(grid_config.clone());
        let config = create_agent_config(&env, &args, LR_MLP)
            .model_config(CandleQNetConfig::default().units(vec![16]));

        train::<CandleQNet>(&args, config, grid_config)?;
        assert!(tmp_dir.path().join("dqn_model_test.safetensors").exists());

        let mean = eval::<CandleQNet>(tmp_dir.path(), "test", 2)?;
        assert!(mean.is_finite());
        Ok(())
    }
}
