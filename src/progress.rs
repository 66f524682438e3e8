// src/progress.rs
use crate::runner::{EntityReport, RunReport};

/// Per-run status reporting. Frontends implement this to surface what the
/// poller is doing; every method has a no-op default.
pub trait Progress {
    /// Called once the diff is known, with the number of alerts to send.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One alert was handled (delivered, failed or held back).
    fn item_done(&mut self, _item: &EntityReport) {}

    /// Called after the snapshot was persisted.
    fn finish(&mut self, _report: &RunReport) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}
