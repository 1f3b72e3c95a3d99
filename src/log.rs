// src/log.rs
//
// Subscriber setup behind the logf!/logd!/logw!/loge! macros.
// Everything goes to a debug log under the store directory; the CLI can
// additionally mirror to stderr.

use std::{
    fs::{self, OpenOptions},
    sync::{Mutex, OnceLock},
};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::options::LogOptions;

static INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber. Later calls are no-ops, as is a call made
/// after some other subscriber was installed (tests, embedding apps).
pub fn init(opts: &LogOptions) -> crate::Result<()> {
    if INIT.get().is_some() {
        return Ok(());
    }

    if let Some(parent) = opts.file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&opts.file)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&opts.level));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file));

    let stderr_layer = opts.stderr.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init();

    let _ = INIT.set(());
    logd!("Log: initialized level={} file={}", opts.level, opts.file.display());
    Ok(())
}
