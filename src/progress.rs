// src/progress.rs
//
// Status reporting for fetches. The tracker thread owns one sink and feeds it
// from every update; the GUI shows it in the status bar, the CLI prints it.

pub trait Progress {
    /// Number of items about to be processed, when known.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One question was parsed and accepted.
    fn item_done(&mut self, _label: &str) {}

    /// The whole update failed.
    fn failed(&mut self, _err: &crate::Error) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Forwards status lines to the log; counts items quietly.
#[derive(Default)]
pub struct LogProgress {
    total: usize,
    done: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
    }
    fn log(&mut self, msg: &str) {
        logf!("{}", msg);
    }
    fn item_done(&mut self, label: &str) {
        self.done += 1;
        logd!("Parsed ({}/{}): {}", self.done, self.total, label);
    }
    fn failed(&mut self, err: &crate::Error) {
        loge!("Update failed: {}", err);
    }
    fn finish(&mut self) {
        logf!("Fetch complete ({}/{})", self.done, self.total);
    }
}
