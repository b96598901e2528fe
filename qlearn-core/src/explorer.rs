//! Epsilon-greedy action selection.
use anyhow::Result;
use log::trace;
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer.
///
/// With probability `epsilon` a uniformly random action is taken; otherwise
/// the action with the highest value. `epsilon` decreases linearly by
/// `epsilon_decay` per learning step down to `epsilon_min`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Current exploration probability.
    pub epsilon: f64,

    /// Floor of `epsilon`.
    pub epsilon_min: f64,

    /// Amount subtracted from `epsilon` by [`EpsilonGreedy::decay`].
    pub epsilon_decay: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 5e-4,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new(epsilon: f64, epsilon_min: f64, epsilon_decay: f64) -> Self {
        Self {
            epsilon,
            epsilon_min,
            epsilon_decay,
        }
    }

    /// Selects an action in `[0, n_actions)`.
    ///
    /// `action_values` is only evaluated when exploiting. Its output must have
    /// `n_actions` elements.
    pub fn select<R, F>(&self, n_actions: usize, rng: &mut R, action_values: F) -> Result<usize>
    where
        R: Rng + ?Sized,
        F: FnOnce() -> Result<Array1<f32>>,
    {
        if rng.gen::<f64>() < self.epsilon {
            let a = rng.gen_range(0..n_actions);
            trace!("explore: action={}", a);
            Ok(a)
        } else {
            let values = action_values()?;
            let a = argmax(values.view());
            trace!(
                "exploit: values={}, probs={}, action={}",
                values,
                softmax(values.view()),
                a
            );
            Ok(a)
        }
    }

    /// `epsilon = max(epsilon - epsilon_decay, epsilon_min)`, never increasing.
    pub fn decay(&mut self) {
        let eps = (self.epsilon - self.epsilon_decay).max(self.epsilon_min);
        self.epsilon = eps.min(self.epsilon);
    }

    /// Sets the initial exploration probability.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Sets the floor of the exploration probability.
    pub fn epsilon_min(mut self, v: f64) -> Self {
        self.epsilon_min = v;
        self
    }

    /// Sets the linear decay step.
    pub fn epsilon_decay(mut self, v: f64) -> Self {
        self.epsilon_decay = v;
        self
    }
}

/// Index of the largest value. Ties go to the lowest index, NaNs are skipped,
/// and an empty or all-NaN input gives 0.
///
/// Acting on a row with NaNs still yields a valid action. The NaNs are caught
/// by [`crate::Dqn::learn`], which refuses to fit non-finite targets.
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i).unwrap_or(0)
}

/// Normalized exponential of `values`.
pub fn softmax(values: ArrayView1<f32>) -> Array1<f32> {
    let max = values.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    let exp = values.mapv(|v| (v - max).exp());
    let sum = exp.sum();
    exp / sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_argmax_ties_and_nan() {
        assert_eq!(argmax(array![1.0f32, 3.0, 3.0, 2.0].view()), 1);
        assert_eq!(argmax(array![-1.0f32, -1.0].view()), 0);
        assert_eq!(argmax(array![f32::NAN, -5.0, f32::NAN].view()), 1);
        assert_eq!(argmax(array![f32::NAN, f32::NAN].view()), 0);
    }

    #[test]
    fn test_softmax() {
        let p = softmax(array![1.0f32, 2.0, 3.0].view());
        assert!((p.sum() - 1.0).abs() < 1e-6);
        assert!(p[0] < p[1] && p[1] < p[2]);
        assert_eq!(argmax(p.view()), 2);
    }

    #[test]
    fn test_full_exploration_skips_values() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let explorer = EpsilonGreedy::new(1.0, 0.0, 0.0);
        let mut seen = [false; 4];

        for _ in 0..200 {
            let a = explorer.select(4, &mut rng, || panic!("values evaluated while exploring"))?;
            seen[a] = true;
        }
        assert!(seen.iter().all(|&s| s));
        Ok(())
    }

    #[test]
    fn test_full_exploitation_is_greedy() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let explorer = EpsilonGreedy::new(0.0, 0.0, 0.0);

        for _ in 0..50 {
            let a = explorer.select(3, &mut rng, || Ok(array![0.1f32, 0.7, 0.7]))?;
            assert_eq!(a, 1);
        }
        Ok(())
    }

    #[test]
    fn test_action_in_range() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(1);
        for &eps in &[0.0, 0.25, 0.5, 1.0] {
            let explorer = EpsilonGreedy::default().epsilon(eps);
            for _ in 0..100 {
                let a = explorer.select(5, &mut rng, || Ok(array![0.0f32, 1.0, 9.0, 1.0, 0.0]))?;
                assert!(a < 5);
            }
        }
        Ok(())
    }

    #[test]
    fn test_decay_is_floored_and_monotone() {
        let mut explorer = EpsilonGreedy::new(0.05, 0.01, 0.015);
        let mut prev = explorer.epsilon;

        for _ in 0..10 {
            explorer.decay();
            assert!(explorer.epsilon <= prev);
            assert!(explorer.epsilon >= 0.01);
            prev = explorer.epsilon;
        }
        assert_eq!(explorer.epsilon, 0.01);

        // Starting below the floor never raises epsilon.
        let mut explorer = EpsilonGreedy::new(0.001, 0.01, 0.1);
        explorer.decay();
        assert_eq!(explorer.epsilon, 0.001);
    }
}
