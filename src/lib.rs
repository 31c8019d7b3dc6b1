//! Treeline: an incremental archiver for a tree-structured content forum
//!
//! This crate archives a story-and-comments forum that exposes only paginated
//! HTML listings and per-item pages. It discovers every numeric item
//! identifier, fetches each item page at most once, and parses it into
//! immutable archived records, making exactly one small unit of progress per
//! invocation of the crawl scheduler.

pub mod config;
pub mod crawler;
pub mod server;
pub mod storage;

use thiserror::Error;

/// Main error type for Treeline operations
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Response from {url} is missing the expected content marker")]
    MissingMarker { url: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Treeline operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_next, CrawlStep, Fetcher, STEP_CYCLE};
pub use storage::{ArchivedItem, CoverageState, PendingEntry, SchedulerState};
