use super::{Transition, TransitionBatch};
use crate::error::QlearnError;
use ndarray::{ArrayD, Axis, IxDyn};
use rand::{seq::index, Rng};

/// A fixed-capacity circular replay memory.
pub struct ReplayMemory {
    capacity: usize,

    // Number of transitions stored since construction. Never wraps.
    count: usize,

    state_shape: Vec<usize>,
    states: ArrayD<f32>,
    actions: Vec<usize>,
    rewards: Vec<f32>,
    next_states: ArrayD<f32>,
    terminals: Vec<bool>,
}

impl ReplayMemory {
    /// Allocates zero-filled storage for `capacity` transitions whose states
    /// have shape `state_shape`.
    ///
    /// `capacity` must be positive.
    pub fn new(capacity: usize, state_shape: Vec<usize>) -> Self {
        let mut shape = Vec::with_capacity(state_shape.len() + 1);
        shape.push(capacity);
        shape.extend_from_slice(&state_shape);

        Self {
            capacity,
            count: 0,
            states: ArrayD::zeros(IxDyn(&shape)),
            actions: vec![0; capacity],
            rewards: vec![0.; capacity],
            next_states: ArrayD::zeros(IxDyn(&shape)),
            terminals: vec![false; capacity],
            state_shape,
        }
    }

    fn check_shape(&self, state: &ArrayD<f32>) -> Result<(), QlearnError> {
        if state.shape() != self.state_shape.as_slice() {
            return Err(QlearnError::ShapeMismatch {
                expected: self.state_shape.clone(),
                got: state.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// Stores a transition in slot `count % capacity` and increments `count`.
    ///
    /// Once the memory is full the oldest transition is overwritten. States of
    /// the wrong shape are rejected before any field is written.
    pub fn store(
        &mut self,
        state: &ArrayD<f32>,
        action: usize,
        reward: f32,
        next_state: &ArrayD<f32>,
        done: bool,
    ) -> Result<(), QlearnError> {
        self.check_shape(state)?;
        self.check_shape(next_state)?;

        let i = self.count % self.capacity;
        self.states.index_axis_mut(Axis(0), i).assign(state);
        self.actions[i] = action;
        self.rewards[i] = reward;
        self.next_states.index_axis_mut(Axis(0), i).assign(next_state);
        self.terminals[i] = done;
        self.count += 1;

        Ok(())
    }

    /// Stores a [`Transition`].
    pub fn push(&mut self, tr: &Transition) -> Result<(), QlearnError> {
        self.store(&tr.state, tr.action, tr.reward, &tr.next_state, tr.done)
    }

    /// Draws `batch_size` distinct slots uniformly from the valid range
    /// `[0, min(count, capacity))` and gathers their transitions.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        batch_size: usize,
        rng: &mut R,
    ) -> Result<TransitionBatch, QlearnError> {
        if batch_size > self.len() {
            return Err(QlearnError::InsufficientTransitions {
                count: self.count,
                batch_size,
            });
        }

        let ixs = index::sample(rng, self.len(), batch_size).into_vec();

        Ok(TransitionBatch {
            states: self.states.select(Axis(0), &ixs),
            actions: ixs.iter().map(|&ix| self.actions[ix]).collect(),
            rewards: ixs.iter().map(|&ix| self.rewards[ix]).collect(),
            next_states: self.next_states.select(Axis(0), &ixs),
            terminals: ixs.iter().map(|&ix| self.terminals[ix]).collect(),
            ixs,
        })
    }

    /// Returns the transition in `slot`, or `None` outside the valid range.
    pub fn get(&self, slot: usize) -> Option<Transition> {
        if slot >= self.len() {
            return None;
        }

        Some(Transition {
            state: self.states.index_axis(Axis(0), slot).to_owned(),
            action: self.actions[slot],
            reward: self.rewards[slot],
            next_state: self.next_states.index_axis(Axis(0), slot).to_owned(),
            done: self.terminals[slot],
        })
    }

    /// Number of valid slots, `min(count, capacity)`.
    pub fn len(&self) -> usize {
        self.count.min(self.capacity)
    }

    /// Returns `true` if nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of transitions stored since construction.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Maximum number of transitions kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shape of a single state.
    pub fn state_shape(&self) -> &[usize] {
        &self.state_shape
    }

    /// Sum of the rewards in the valid slots.
    pub fn sum_rewards(&self) -> f32 {
        self.rewards[..self.len()].iter().sum()
    }

    /// Number of terminal transitions in the valid slots.
    pub fn num_terminals(&self) -> usize {
        self.terminals[..self.len()].iter().filter(|&&d| d).count()
    }
}
