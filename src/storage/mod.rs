//! Storage module for persisting harvested items and runtime configuration
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Seeding and updating the runtime-tunable configuration keys
//! - First-write-wins insertion of trending items
//! - Paged, date-filtered reads of stored items

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::CrawlerConfig;
use chrono::{DateTime, SecondsFormat, Utc};

/// Raw cookie text for the target site
pub const CONFIG_COOKIES: &str = "cookies";

/// Number of items read per cycle
pub const CONFIG_FETCH_COUNT: &str = "fetchCount";

/// Delay between cycles in milliseconds
pub const CONFIG_FETCH_INTERVAL: &str = "fetchInterval";

/// Values written for the configuration keys the first time a store is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigDefaults {
    pub fetch_count: usize,
    pub fetch_interval: u64,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self {
            fetch_count: 20,
            fetch_interval: 3_600_000,
        }
    }
}

impl From<&CrawlerConfig> for ConfigDefaults {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            fetch_count: config.default_fetch_count,
            fetch_interval: config.default_fetch_interval,
        }
    }
}

/// A runtime configuration row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub description: String,
}

/// A trending item as persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredItem {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub url: String,
    pub excerpt: String,
    pub heat: String,
    pub rank: u32,
    pub created_at: String,
}

/// Outcome of a batch insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveResult {
    /// Items whose external id had never been stored before
    pub inserted_count: usize,
}

/// Inclusive bounds on `created_at`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// A page request over stored items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemQuery {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub range: DateRange,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            range: DateRange::default(),
        }
    }
}

impl ItemQuery {
    /// Rows to skip for this page; page 0 is treated as page 1
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }
}

/// Formats a timestamp the way `created_at` is stored
///
/// Fixed-width UTC with millisecond precision, so string comparison in SQL
/// matches chronological order.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
