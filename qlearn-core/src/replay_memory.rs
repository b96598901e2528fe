//! Fixed-capacity circular store of transitions.
//!
//! [`ReplayMemory`] keeps parallel arrays of states, actions, rewards, next
//! states and terminal flags. Writes go to slot `count % capacity`, so once the
//! memory is full every new transition replaces the oldest one. Batches are
//! drawn uniformly without replacement from the slots written so far.
//!
//! ```rust
//! use ndarray::ArrayD;
//! use qlearn_core::ReplayMemory;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut memory = ReplayMemory::new(100, vec![2]);
//! let s = ArrayD::<f32>::zeros(vec![2]);
//! for t in 0..10 {
//!     memory.store(&s, t % 3, 1.0, &s, t == 9).unwrap();
//! }
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let batch = memory.sample(4, &mut rng).unwrap();
//! assert_eq!(batch.len(), 4);
//! ```
mod base;
mod batch;
pub use base::ReplayMemory;
pub use batch::{Transition, TransitionBatch};
