// src/config/consts.rs

// Site
pub const SITE_ORIGIN: &str = "https://www.zhihu.com";
pub const POTENTIAL_URL: &str =
    "https://www.zhihu.com/creator/potential-question/potential/100002/all";

// Browser driver
pub const DRIVER_PATH: &str = "driver/geckodriver";
pub const DRIVER_PORT: u16 = 4444;
pub const DRIVER_READY_TIMEOUT_MS: u64 = 15_000;
pub const COOKIE_PATH: &str = "cookies";

// Page loading (the potential list is rendered client-side and lazy-loads on scroll)
pub const PAGE_LOAD_WAIT_MS: u64 = 5_000;
pub const SCROLL_ROUNDS: u32 = 10;
pub const SCROLL_PAUSE_MS: u64 = 500;
pub const SETTLE_MS: u64 = 1_000;
pub const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

// Local store
pub const DATA_FILE: &str = "questions.json";
pub const WATCHED_FILE: &str = "watched_questions.json";
pub const MAX_HISTORY: usize = 3;
pub const SAVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Tracker
pub const TRACK_INTERVAL_SECS: u64 = 10 * 60;

// Config / logs
pub const CONFIG_FILE: &str = "tracker.toml";
pub const LOG_FILE: &str = ".store/debug.log";
pub const LOG_LEVEL: &str = "info";
