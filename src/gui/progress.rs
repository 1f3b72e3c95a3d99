// src/gui/progress.rs
use std::sync::{Arc, Mutex};

use eframe::egui;

use crate::{progress::Progress, tracker::lock};

/// Writes tracker progress into the status bar text and wakes the UI.
pub struct GuiProgress {
    status: Arc<Mutex<String>>,
    ctx: egui::Context,
    done: usize,
    total: usize,
}

impl GuiProgress {
    pub fn new(status: Arc<Mutex<String>>, ctx: egui::Context) -> Self {
        Self { status, ctx, done: 0, total: 0 }
    }
    fn set_status(&self, msg: impl Into<String>) {
        *lock(&self.status) = msg.into();
        self.ctx.request_repaint();
    }
}

impl Progress for GuiProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.done = 0;
        self.set_status(format!("Parsing {total} item(s)…"));
    }
    fn log(&mut self, msg: &str) {
        self.set_status(s!(msg));
    }
    fn item_done(&mut self, _label: &str) {
        self.done += 1;
    }
    fn failed(&mut self, err: &crate::Error) {
        self.set_status(format!("Update failed: {err}"));
    }
    fn finish(&mut self) {
        if self.total == 0 {
            self.set_status(s!("Fetch complete")); // nothing on the page
        } else {
            self.set_status(format!("Fetch complete ({}/{})", self.done, self.total));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_progress() {
        let status = Arc::new(Mutex::new(String::new()));
        let mut p = GuiProgress::new(Arc::clone(&status), egui::Context::default());

        p.begin(3);
        assert_eq!(*status.lock().unwrap(), "Parsing 3 item(s)…");
        p.item_done("a");
        p.item_done("b");
        p.finish();
        assert_eq!(*status.lock().unwrap(), "Fetch complete (2/3)");

        p.log("Updated: 1 updated, 0 new");
        assert_eq!(*status.lock().unwrap(), "Updated: 1 updated, 0 new");
    }
}
