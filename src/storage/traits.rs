//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::TrendingItem;
use crate::storage::{ConfigEntry, DateRange, ItemQuery, SaveResult, StoredItem};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes take `&mut self`; callers sharing a store across tasks wrap it in
/// `Arc<Mutex<_>>`, which also makes every batch write atomic with respect to
/// readers.
pub trait Storage {
    // ===== Runtime Configuration =====

    /// Looks up a configuration value; a missing key is `Ok(None)`
    fn get_config(&self, key: &str) -> StorageResult<Option<String>>;

    /// Updates an existing configuration value
    ///
    /// Returns the number of rows changed. Unknown keys are never created, so
    /// the result is 0 for them.
    fn update_config(&mut self, key: &str, value: &str) -> StorageResult<usize>;

    /// Lists every configuration row in creation order
    fn list_configs(&self) -> StorageResult<Vec<ConfigEntry>>;

    // ===== Items =====

    /// Persists a batch of items in one transaction
    ///
    /// Items whose external id is already stored (or repeated earlier in the
    /// same batch) are skipped and not counted. On failure nothing from the
    /// batch is committed.
    fn save_items(&mut self, items: &[TrendingItem]) -> StorageResult<SaveResult>;

    /// Reads one page of stored items, newest first, rank ascending within a batch
    fn list_items(&self, query: &ItemQuery) -> StorageResult<Vec<StoredItem>>;

    /// Counts stored items matching the range
    fn count_items(&self, range: &DateRange) -> StorageResult<u64>;
}
