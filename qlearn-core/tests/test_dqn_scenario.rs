use anyhow::Result;
use ndarray::{arr1, ArrayD, Axis};
use qlearn_core::{Dqn, DqnConfig, LinearQ, LinearQConfig, Phase, QNetwork};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashSet;

const REWARDS: [f32; 4] = [1.0, 2.0, 3.0, 4.0];

fn state(t: usize) -> ArrayD<f32> {
    arr1(&[t as f32, 1.0]).into_dyn()
}

fn config(seed: u64) -> DqnConfig<LinearQConfig> {
    DqnConfig::default()
        .state_shape(vec![2])
        .n_actions(2)
        .memory_capacity(5)
        .batch_size(3)
        .gamma(0.9)
        .seed(seed)
        .model_config(LinearQConfig {
            init_scale: 0.5,
            seed,
        })
}

fn agent_with_episode(seed: u64) -> Result<Dqn<LinearQ, StdRng>> {
    let mut agent = Dqn::build(config(seed))?;
    for (t, &r) in REWARDS.iter().enumerate() {
        let a = agent.choose_action(&state(t))?;
        agent.store_transition(&state(t), a, r, &state(t + 1), t == 3)?;
    }
    Ok(agent)
}

#[test]
fn test_learn_on_short_episode() -> Result<()> {
    let mut slot3_sampled = false;

    for seed in 0..20 {
        let mut agent = agent_with_episode(seed)?;
        assert_eq!(agent.phase(), Phase::Learning);
        assert_eq!(agent.memory().len(), 4);

        // Parameters change during the update, so bootstrap values are taken before.
        let expected: Vec<f32> = (0..3)
            .map(|ix| -> Result<f32> { Ok(REWARDS[ix] + 0.9 * max_q(&agent, ix + 1)?) })
            .collect::<Result<_>>()?;

        let stats = agent.learn()?.expect("learning step after warm-up");
        let distinct: HashSet<_> = stats.ixs.iter().copied().collect();
        assert_eq!(stats.ixs.len(), 3);
        assert_eq!(distinct.len(), 3);
        assert!(stats.ixs.iter().all(|&ix| ix < 4));

        for (&ix, &target) in stats.ixs.iter().zip(stats.targets.iter()) {
            if ix == 3 {
                assert_eq!(target, 4.0);
                slot3_sampled = true;
            } else {
                assert!((target - expected[ix]).abs() < 1e-5);
            }
        }
    }
    assert!(slot3_sampled);
    Ok(())
}

fn max_q(agent: &Dqn<LinearQ, StdRng>, t: usize) -> Result<f32> {
    let q = agent.qnet().forward(&state(t).insert_axis(Axis(0)))?;
    Ok(q.fold(f32::NEG_INFINITY, |m, &v| m.max(v)))
}

#[test]
fn test_warmup_then_learning() -> Result<()> {
    let mut agent: Dqn<LinearQ> = Dqn::build(config(1))?;
    let eps0 = agent.epsilon();

    for t in 0..2 {
        agent.store_transition(&state(t), 0, REWARDS[t], &state(t + 1), false)?;
        assert_eq!(agent.phase(), Phase::WarmingUp);
        assert!(agent.learn()?.is_none());
    }
    assert_eq!(agent.epsilon(), eps0);
    assert_eq!(agent.n_opts(), 0);

    agent.store_transition(&state(2), 1, REWARDS[2], &state(3), false)?;
    assert!(agent.learn()?.is_some());
    assert!(agent.epsilon() < eps0);
    assert_eq!(agent.n_opts(), 1);
    Ok(())
}

#[test]
fn test_memory_keeps_newest_transitions() -> Result<()> {
    let mut agent: Dqn<LinearQ> = Dqn::build(config(3))?;
    for t in 0..7 {
        agent.store_transition(&state(t), t % 2, t as f32, &state(t + 1), false)?;
    }

    let memory = agent.memory();
    assert_eq!(memory.len(), 5);
    assert_eq!(memory.count(), 7);
    // Slots 0 and 1 were overwritten by the 6th and 7th transitions.
    let rewards: Vec<f32> = (0..5).filter_map(|i| memory.get(i)).map(|tr| tr.reward).collect();
    assert_eq!(rewards, vec![5.0, 6.0, 2.0, 3.0, 4.0]);
    Ok(())
}
