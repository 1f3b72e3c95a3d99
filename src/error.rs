// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver error ({error}): {message}")]
    WebDriver { error: String, message: String },

    #[error("Could not start driver: {0}")]
    DriverLaunch(String),

    #[error("Cookie file {}: {reason}", path.display())]
    Cookies { path: PathBuf, reason: String },

    #[error("Cannot parse {field} from {raw:?}")]
    Parse { field: &'static str, raw: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(field: &'static str, raw: impl Into<String>) -> Self {
        Error::Parse { field, raw: raw.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
