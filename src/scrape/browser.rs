// src/scrape/browser.rs
use std::thread;

use super::{Fetch, Question, questions_from_source};
use crate::{
    config::{consts::SCROLL_SCRIPT, options::ScraperOptions},
    core::{Cookie, Driver, cookies::load_cookies},
    error::Result,
    progress::Progress,
};

/// Scrapes the live page through a cookie-authenticated Firefox session.
/// The browser starts on first fetch and is reused until `close`.
pub struct BrowserScraper {
    opts: ScraperOptions,
    driver: Option<Driver>,
}

impl BrowserScraper {
    pub fn new(opts: ScraperOptions) -> Self {
        Self { opts, driver: None }
    }
}

impl Fetch for BrowserScraper {
    fn fetch(&mut self, mut progress: Option<&mut dyn Progress>) -> Result<Vec<Question>> {
        // Re-read every time so a refreshed cookie file is picked up without a restart.
        let cookies = load_cookies(&self.opts.cookie_path)?;

        if self.driver.is_none() {
            if let Some(p) = progress.as_deref_mut() {
                p.log("Starting browser…");
            }
            self.driver = Some(Driver::launch(&self.opts)?);
        }

        let Some(driver) = self.driver.as_ref() else {
            return Ok(Vec::new());
        };
        // reborrow with a shorter object lifetime so `progress` can be moved below
        let page_progress = progress.as_mut().map(|p| &mut **p as &mut dyn Progress);
        match load_page(driver, &self.opts, &cookies, page_progress) {
            Ok(html) => Ok(questions_from_source(&html, progress)),
            Err(e) => {
                // Session is in an unknown state; start fresh next time.
                loge!("Scrape: browser session failed: {}", e);
                self.driver = None;
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.quit();
        }
    }
}

fn load_page(
    driver: &Driver,
    opts: &ScraperOptions,
    cookies: &[Cookie],
    mut progress: Option<&mut dyn Progress>,
) -> Result<String> {
    if let Some(p) = progress.as_deref_mut() {
        p.log("Loading page…");
    }

    // Cookies can only be set for the domain currently loaded.
    driver.navigate(&opts.url)?;
    for cookie in cookies {
        driver.add_cookie(cookie)?;
    }
    driver.navigate(&opts.url)?;
    thread::sleep(opts.page_load_wait());

    // The list lazy-loads as it is scrolled.
    for round in 0..opts.scroll_rounds {
        driver.execute(SCROLL_SCRIPT)?;
        thread::sleep(opts.scroll_pause());
        logd!("Scrape: scroll {}/{}", round + 1, opts.scroll_rounds);
    }
    thread::sleep(opts.settle());

    driver.page_source()
}
