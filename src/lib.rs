// src/lib.rs

#[macro_use]
pub mod macros;

pub mod analyzer;
pub mod config;
pub mod core;
pub mod error;
pub mod gui;
pub mod log;
pub mod progress;
pub mod scrape;
pub mod specs;
pub mod store;
pub mod tracker;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};

// Re-exported for the logging macros.
#[doc(hidden)]
pub use tracing;
