// src/scrape/mod.rs
//
// Fetchers produce scraped questions; the tracker drives them through `Fetch`.
// - BrowserScraper: live page through geckodriver + headless Firefox
// - SnapshotScraper: a saved copy of the rendered page (offline runs, fixtures)

mod browser;
mod snapshot;

pub use browser::BrowserScraper;
pub use snapshot::SnapshotScraper;
pub use crate::specs::potential::{Question, RawQuestion};

use std::{fs, path::Path};

use crate::{
    config::options::{ScraperOptions, SourceKind},
    error::{Error, Result},
    progress::Progress,
    specs::potential,
};

/// One source of scraped questions.
pub trait Fetch: Send {
    /// Fetch the current list of potential questions.
    fn fetch(&mut self, progress: Option<&mut dyn Progress>) -> Result<Vec<Question>>;

    /// Release whatever the fetcher holds (browser session, driver process).
    fn close(&mut self) {}
}

impl<F: Fetch + ?Sized> Fetch for Box<F> {
    fn fetch(&mut self, progress: Option<&mut dyn Progress>) -> Result<Vec<Question>> {
        (**self).fetch(progress)
    }
    fn close(&mut self) {
        (**self).close()
    }
}

pub fn scraper_from_options(opts: &ScraperOptions) -> Result<Box<dyn Fetch>> {
    match opts.source {
        SourceKind::Browser => Ok(Box::new(BrowserScraper::new(opts.clone()))),
        SourceKind::File => {
            let path = opts.snapshot_path.clone().ok_or_else(|| {
                Error::Config(s!("scraper.snapshot_path is required for file source"))
            })?;
            Ok(Box::new(SnapshotScraper::new(path)))
        }
    }
}

/// Parse a page source, logging items that could not be converted.
pub(crate) fn questions_from_source(
    html: &str,
    mut progress: Option<&mut dyn Progress>,
) -> Vec<Question> {
    let (questions, failed) = potential::parse_questions(html);

    if let Some(p) = progress.as_deref_mut() {
        p.begin(questions.len() + failed.len());
    }
    for e in &failed {
        logw!("Scrape: skipped item: {}", e);
    }
    if let Some(p) = progress.as_deref_mut() {
        for q in &questions {
            p.item_done(&q.question_text);
        }
        p.finish();
    }

    logf!("Scrape: parsed {} question(s), {} skipped", questions.len(), failed.len());
    questions
}

/// Write a scrape result as pretty JSON (same shape as the old
/// `potential_data.json` dumps).
pub fn write_questions(path: &Path, questions: &[Question]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(questions)?)?;
    logf!("Scrape: wrote {} question(s) to {}", questions.len(), path.display());
    Ok(())
}

pub fn read_questions(path: &Path) -> Result<Vec<Question>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/potential_data.json");
        let qs = vec![Question {
            question_text: s!("为什么？"),
            question_url: s!("https://www.zhihu.com/question/1"),
            view_total: 1_420_000,
            ..Question::default()
        }];
        write_questions(&path, &qs).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("为什么？"), "non-ASCII kept verbatim");
        assert_eq!(read_questions(&path).unwrap(), qs);
    }

    #[test]
    fn file_source_needs_a_path() {
        let opts = ScraperOptions { source: SourceKind::File, ..ScraperOptions::default() };
        assert!(matches!(scraper_from_options(&opts), Err(Error::Config(_))));
    }
}
