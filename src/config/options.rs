// src/config/options.rs
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use super::consts::*;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    pub scraper: ScraperOptions,
    pub store: StoreOptions,
    pub tracker: TrackerOptions,
    pub log: LogOptions,
}

impl AppOptions {
    /// Load options from a TOML file. A missing file means defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            logd!("Config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let opts = Self::from_toml(&text)?;
        logf!("Config: loaded {}", path.display());
        Ok(opts)
    }

    pub fn from_toml(text: &str) -> crate::Result<Self> {
        let opts: Self = toml::from_str(text)?;
        opts.validate()?;
        Ok(opts)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.store.max_history == 0 {
            return Err(crate::Error::Config(s!("store.max_history must be at least 1")));
        }
        if self.tracker.interval_secs == 0 {
            return Err(crate::Error::Config(s!("tracker.interval_secs must be at least 1")));
        }
        if self.scraper.source == SourceKind::File && self.scraper.snapshot_path.is_none() {
            return Err(crate::Error::Config(s!(
                "scraper.snapshot_path is required when scraper.source = \"file\""
            )));
        }
        Ok(())
    }
}

/// Where question pages come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Live page through a headless Firefox session.
    #[default]
    Browser,
    /// A saved copy of the rendered page.
    File,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScraperOptions {
    pub source: SourceKind,
    pub url: String,
    pub driver_path: PathBuf,
    pub driver_port: u16,
    pub cookie_path: PathBuf,
    pub headless: bool,
    pub page_load_wait_ms: u64,
    pub scroll_rounds: u32,
    pub scroll_pause_ms: u64,
    pub settle_ms: u64,
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            source: SourceKind::Browser,
            url: s!(POTENTIAL_URL),
            driver_path: PathBuf::from(DRIVER_PATH),
            driver_port: DRIVER_PORT,
            cookie_path: PathBuf::from(COOKIE_PATH),
            headless: true,
            page_load_wait_ms: PAGE_LOAD_WAIT_MS,
            scroll_rounds: SCROLL_ROUNDS,
            scroll_pause_ms: SCROLL_PAUSE_MS,
            settle_ms: SETTLE_MS,
            snapshot_path: None,
        }
    }
}

impl ScraperOptions {
    pub fn page_load_wait(&self) -> Duration { Duration::from_millis(self.page_load_wait_ms) }
    pub fn scroll_pause(&self) -> Duration { Duration::from_millis(self.scroll_pause_ms) }
    pub fn settle(&self) -> Duration { Duration::from_millis(self.settle_ms) }

    pub fn driver_base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.driver_port)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    pub data_file: PathBuf,
    pub watched_file: PathBuf,
    /// Snapshots kept per question, oldest dropped first.
    pub max_history: usize,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DATA_FILE),
            watched_file: PathBuf::from(WATCHED_FILE),
            max_history: MAX_HISTORY,
        }
    }
}

impl StoreOptions {
    /// Both files under one directory; handy for tests and alternate profiles.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            data_file: dir.join(DATA_FILE),
            watched_file: dir.join(WATCHED_FILE),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerOptions {
    pub interval_secs: u64,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self { interval_secs: TRACK_INTERVAL_SECS }
    }
}

impl TrackerOptions {
    pub fn interval(&self) -> Duration { Duration::from_secs(self.interval_secs) }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    pub level: String,
    pub file: PathBuf,
    /// Mirror log lines to stderr (CLI --verbose).
    pub stderr: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: s!(LOG_LEVEL),
            file: PathBuf::from(LOG_FILE),
            stderr: false,
        }
    }
}
