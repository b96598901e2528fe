//! Records of learning statistics and their destinations.
//!
//! The agent and the [`Trainer`](crate::Trainer) produce [`Record`]s, e.g. the
//! loss of an update step or the return of an episode. A [`Recorder`] decides
//! where they go.
//!
//! ```rust
//! use qlearn_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("episode", RecordValue::Scalar(3.0));
//! record.insert("return", RecordValue::Scalar(-1.0));
//! ```
mod base;
mod buffered_recorder;
mod log_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use log_recorder::LogRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
