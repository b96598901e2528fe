//! TD targets and action-value gathering.
use crate::error::QlearnError;
use ndarray::{Array2, ArrayView1};

/// Bootstrapped Q-learning targets `r + gamma * max_a Q(s', a)`.
///
/// The next-state values of terminal samples are treated as zero, so their
/// target is exactly the reward whatever `q_next` holds for them. A NaN in
/// the next-state values of a non-terminal sample makes its target NaN.
pub fn td_targets(rewards: &[f32], q_next: &Array2<f32>, terminals: &[bool], gamma: f64) -> Vec<f32> {
    let gamma = gamma as f32;
    q_next
        .outer_iter()
        .zip(rewards.iter().zip(terminals.iter()))
        .map(|(row, (&r, &done))| {
            if done {
                r
            } else {
                r + gamma * max_or_nan(row)
            }
        })
        .collect()
}

fn max_or_nan(row: ArrayView1<f32>) -> f32 {
    row.fold(f32::NEG_INFINITY, |m, &v| {
        if v.is_nan() || m.is_nan() {
            f32::NAN
        } else {
            m.max(v)
        }
    })
}

/// Selects `q[i, actions[i]]` for every row.
pub fn gather(q: &Array2<f32>, actions: &[usize]) -> Result<Vec<f32>, QlearnError> {
    let n_actions = q.ncols();
    if q.nrows() != actions.len() {
        return Err(QlearnError::ShapeMismatch {
            expected: vec![actions.len(), n_actions],
            got: q.shape().to_vec(),
        });
    }

    actions
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            if a < n_actions {
                Ok(q[[i, a]])
            } else {
                Err(QlearnError::ActionOutOfRange {
                    action: a,
                    n_actions,
                })
            }
        })
        .collect()
}
