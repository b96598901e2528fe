use ndarray::ArrayD;

/// One environment step `(s_t, a_t, r_t, s_t+1, done_t)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// State in which the action was taken.
    pub state: ArrayD<f32>,

    /// Index of the action taken.
    pub action: usize,

    /// Reward received.
    pub reward: f32,

    /// State reached after the action.
    pub next_state: ArrayD<f32>,

    /// `true` if `next_state` is terminal.
    pub done: bool,
}

impl Transition {
    /// Constructs a transition.
    pub fn new(
        state: ArrayD<f32>,
        action: usize,
        reward: f32,
        next_state: ArrayD<f32>,
        done: bool,
    ) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Transitions gathered at sampled slots of a [`ReplayMemory`].
///
/// `states` and `next_states` have a leading batch axis.
///
/// [`ReplayMemory`]: super::ReplayMemory
#[derive(Clone, Debug)]
pub struct TransitionBatch {
    /// States, shape `[batch, state_shape..]`.
    pub states: ArrayD<f32>,

    /// Actions taken.
    pub actions: Vec<usize>,

    /// Rewards received.
    pub rewards: Vec<f32>,

    /// Next states, shape `[batch, state_shape..]`.
    pub next_states: ArrayD<f32>,

    /// Terminal flags.
    pub terminals: Vec<bool>,

    /// Slots of the memory the samples were taken from.
    pub ixs: Vec<usize>,
}

impl TransitionBatch {
    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if the batch has no samples.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}
