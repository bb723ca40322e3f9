//! Hotlist: a scheduled harvester for authenticated trending lists
//!
//! This crate periodically renders a trending-list page with an externally
//! supplied session, extracts the ranked items and stores them in SQLite with
//! first-write-wins deduplication.

pub mod config;
pub mod crawler;
pub mod storage;

use thiserror::Error;

/// Main error type for Hotlist operations
#[derive(Debug, Error)]
pub enum HotlistError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] crawler::CrawlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scheduler error: {0}")]
    Scheduler(String),
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

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Hotlist operations
pub type Result<T> = std::result::Result<T, HotlistError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlCycle, CycleOutcome, ErrorKind, Scheduler, TrendingItem};
pub use storage::{SqliteStorage, Storage, StoredItem};
