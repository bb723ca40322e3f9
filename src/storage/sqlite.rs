//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::TrendingItem;
use crate::storage::schema::{initialize_schema, seed_defaults};
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{
    format_timestamp, ConfigDefaults, ConfigEntry, DateRange, ItemQuery, SaveResult, StoredItem,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const ITEM_COLUMNS: &str = "id, external_id, title, url, excerpt, heat, rank, created_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
    committed_batches: u64,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("path", &self.conn.path())
            .field("committed_batches", &self.committed_batches)
            .finish()
    }
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// The parent directory is created when missing. Schema creation and
    /// default seeding are idempotent.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `defaults` - Values seeded for configuration keys that do not exist yet
    pub fn new(path: &Path, defaults: &ConfigDefaults) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        seed_defaults(&mut conn, defaults)?;

        tracing::debug!("Opened database at {}", path.display());

        Ok(Self {
            conn,
            committed_batches: 0,
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory(defaults: &ConfigDefaults) -> StorageResult<Self> {
        let mut conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        seed_defaults(&mut conn, defaults)?;
        Ok(Self {
            conn,
            committed_batches: 0,
        })
    }

    /// Number of item batches committed through this handle
    pub fn committed_batches(&self) -> u64 {
        self.committed_batches
    }

    /// Persists a batch with an explicit `created_at`
    ///
    /// [`Storage::save_items`] calls this with the current time; every row of
    /// the batch shares the timestamp.
    pub fn save_items_at(
        &mut self,
        items: &[TrendingItem],
        created_at: DateTime<Utc>,
    ) -> StorageResult<SaveResult> {
        if items.is_empty() {
            return Ok(SaveResult::default());
        }

        let created_at = format_timestamp(&created_at);
        let tx = self.conn.transaction()?;

        let mut inserted_count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO hot_items (external_id, title, url, excerpt, heat, rank, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for item in items {
                let changed = stmt.execute(params![
                    item.external_id,
                    item.title,
                    item.url,
                    item.excerpt,
                    item.heat,
                    item.rank,
                    created_at,
                ])?;
                if changed > 0 {
                    inserted_count += 1;
                } else {
                    tracing::trace!("Skipping already stored item {}", item.external_id);
                }
            }
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit()?;
        self.committed_batches += 1;

        Ok(SaveResult { inserted_count })
    }
}

fn row_to_stored_item(row: &Row<'_>) -> rusqlite::Result<StoredItem> {
    Ok(StoredItem {
        id: row.get(0)?,
        external_id: row.get(1)?,
        title: row.get(2)?,
        url: row.get(3)?,
        excerpt: row.get(4)?,
        heat: row.get(5)?,
        rank: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn range_params(range: &DateRange) -> (Option<String>, Option<String>) {
    (
        range.start.as_ref().map(format_timestamp),
        range.end.as_ref().map(format_timestamp),
    )
}

impl Storage for SqliteStorage {
    // ===== Runtime Configuration =====

    fn get_config(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM configs WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn update_config(&mut self, key: &str, value: &str) -> StorageResult<usize> {
        let changed = self.conn.execute(
            "UPDATE configs SET value = ?1 WHERE key = ?2",
            params![value, key],
        )?;
        if changed == 0 {
            tracing::debug!("Ignoring update for unknown config key {}", key);
        }
        Ok(changed)
    }

    fn list_configs(&self) -> StorageResult<Vec<ConfigEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, description FROM configs ORDER BY id ASC")?;

        let entries = stmt
            .query_map([], |row| {
                Ok(ConfigEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    // ===== Items =====

    fn save_items(&mut self, items: &[TrendingItem]) -> StorageResult<SaveResult> {
        self.save_items_at(items, Utc::now())
    }

    fn list_items(&self, query: &ItemQuery) -> StorageResult<Vec<StoredItem>> {
        let (start, end) = range_params(&query.range);
        let sql = format!(
            "SELECT {} FROM hot_items
             WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at <= ?2)
             ORDER BY created_at DESC, rank ASC
             LIMIT ?3 OFFSET ?4",
            ITEM_COLUMNS
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(
                params![start, end, query.limit, query.offset() as i64],
                row_to_stored_item,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn count_items(&self, range: &DateRange) -> StorageResult<u64> {
        let (start, end) = range_params(range);
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM hot_items
             WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at <= ?2)",
            params![start, end],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
