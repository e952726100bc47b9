//! Error types for the library layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the library layer, wrapping gateway errors and adding
/// cache store, CSV, and input validation failures.
#[derive(Error, Debug)]
pub enum CsiQuantError {
    /// An error from the underlying gateway client.
    #[error("gateway error: {0}")]
    Api(#[from] baostock_api::Error),
    /// A cached file exists but could not be read or parsed.
    #[error("cache error for {path}: {message}")]
    Cache { path: PathBuf, message: String },
    /// Filesystem I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// CSV encoding or decoding failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// User-provided input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
