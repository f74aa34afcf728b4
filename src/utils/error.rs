// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 500 Internal Server Error

    #[error("SEC rate limit likely exceeded (HTTP {0})")]
    RateLimited(reqwest::StatusCode), // 403 or 429

    #[error("Could not find specified filing: {0}")]
    FilingDocNotFound(String),

    #[error("Request timed out after {0:?}: {1}")]
    Timeout(std::time::Duration, String),

    #[error("Failed to parse EDGAR response: {0}")]
    Parse(String),

    #[error("Request cancelled before it was issued")]
    Cancelled,
}

impl EdgarError {
    /// Maps a non-2xx status to the matching variant.
    pub fn from_status(status: reqwest::StatusCode, url: &str) -> Self {
        match status {
            reqwest::StatusCode::FORBIDDEN | reqwest::StatusCode::TOO_MANY_REQUESTS => {
                EdgarError::RateLimited(status)
            }
            reqwest::StatusCode::NOT_FOUND => EdgarError::FilingDocNotFound(url.to_string()),
            _ => EdgarError::Http(status),
        }
    }
}

/// Why one filing's fetch-and-process task failed.
#[derive(Error, Debug)]
pub enum FilingError {
    #[error(transparent)]
    Edgar(#[from] EdgarError),

    #[error("Processing task failed: {0}")]
    Processing(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed reference file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Invalid year range: from year {from} is after to year {to}")]
    YearRange { from: i32, to: i32 },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError), // Automatically convert Edgar errors

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
