use super::{Record, Recorder};
use log::info;

/// Emits each record as a single `info` log line.
pub struct LogRecorder {
    prefix: String,
}

impl LogRecorder {
    /// Constructs the recorder. `prefix` starts every line.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LogRecorder {
    fn default() -> Self {
        Self::new("train")
    }
}

impl Recorder for LogRecorder {
    fn write(&mut self, record: Record) {
        info!("{}: {}", self.prefix, record);
    }
}
