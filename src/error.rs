//! Error types for the media sorter

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for sorter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the media sorter
///
/// Extraction layers never surface errors; they collapse every failure to
/// `None` and leave it to the orchestrator to decide whether a fallback
/// exists. These variants are what the orchestrator counts.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file type: {path}")]
    UnsupportedExtension { path: PathBuf },

    #[error("failed to extract a timestamp for {path}: {message}")]
    TimestampUnavailable { path: PathBuf, message: String },

    #[error("invalid year in timestamp (<1971) for {path}: {year}")]
    TimestampOutOfRange { path: PathBuf, year: i32 },

    #[error("invalid timezone: '{0}'. Use IANA timezone names like 'Asia/Tokyo'")]
    InvalidTimezone(String),

    #[error("file operation failed: {src} -> {dest}: {message}")]
    Placement {
        src: PathBuf,
        dest: PathBuf,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}
