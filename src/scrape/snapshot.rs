// src/scrape/snapshot.rs
use std::{fs, path::PathBuf};

use super::{Fetch, Question, questions_from_source};
use crate::{error::Result, progress::Progress};

/// Reads a saved page instead of driving a browser.
pub struct SnapshotScraper {
    path: PathBuf,
}

impl SnapshotScraper {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Fetch for SnapshotScraper {
    fn fetch(&mut self, mut progress: Option<&mut dyn Progress>) -> Result<Vec<Question>> {
        if let Some(p) = progress.as_deref_mut() {
            p.log(&format!("Reading {}…", self.path.display()));
        }
        let html = fs::read_to_string(&self.path)?;
        Ok(questions_from_source(&html, progress))
    }
}
