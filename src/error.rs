//! Error types for siasync

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for siasync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for siasync
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("renter API error: {0}")]
    Api(String),

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("path is not valid unicode: {0:?}")]
    InvalidPath(PathBuf),

    #[error("path escapes the synchronized folder: {0:?}")]
    OutsideRoot(PathBuf),

    #[error("you must have formed contracts to upload to Sia")]
    NoContracts,
}
