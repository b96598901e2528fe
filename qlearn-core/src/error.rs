//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum QlearnError {
    /// An array does not have the shape expected by the receiver.
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Given shape.
        got: Vec<usize>,
    },

    /// The replay memory holds fewer transitions than the requested batch.
    #[error("Insufficient transitions: {count} stored, {batch_size} requested")]
    InsufficientTransitions {
        /// Number of transitions stored so far.
        count: usize,
        /// Requested batch size.
        batch_size: usize,
    },

    /// An action index outside of the discrete action space.
    #[error("Action {action} out of range for {n_actions} actions")]
    ActionOutOfRange {
        /// Given action.
        action: usize,
        /// Size of the action space.
        n_actions: usize,
    },

    /// The approximator produced a NaN or infinite value.
    #[error("Non-finite value from the action-value function in sample {index}")]
    NonFiniteValue {
        /// Position in the batch.
        index: usize,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
