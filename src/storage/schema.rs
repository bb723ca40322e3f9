//! Database schema definitions and default configuration seeding

use crate::storage::{ConfigDefaults, CONFIG_COOKIES, CONFIG_FETCH_COUNT, CONFIG_FETCH_INTERVAL};
use rusqlite::{params, Connection};

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Harvested trending items, one row per external id
CREATE TABLE IF NOT EXISTS hot_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    excerpt TEXT NOT NULL,
    heat TEXT NOT NULL,
    rank INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_hot_items_created ON hot_items(created_at);

-- Runtime-tunable parameters
CREATE TABLE IF NOT EXISTS configs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    value TEXT NOT NULL,
    description TEXT NOT NULL
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Seeds the recognized configuration keys
///
/// Existing rows are left untouched, so operator edits survive restarts.
pub fn seed_defaults(conn: &mut Connection, defaults: &ConfigDefaults) -> Result<(), rusqlite::Error> {
    let entries = [
        (CONFIG_COOKIES, String::new(), "Session cookies for the target site"),
        (
            CONFIG_FETCH_COUNT,
            defaults.fetch_count.to_string(),
            "Number of items read per cycle",
        ),
        (
            CONFIG_FETCH_INTERVAL,
            defaults.fetch_interval.to_string(),
            "Delay between cycles (milliseconds)",
        ),
    ];

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO configs (key, value, description) VALUES (?1, ?2, ?3)",
        )?;
        for (key, value, description) in &entries {
            stmt.execute(params![key, value, description])?;
        }
    }
    tx.commit()
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
        assert_eq!(get_schema_version(), 1);
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["hot_items", "configs"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    params![table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_seed_does_not_overwrite() {
        let mut conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        seed_defaults(&mut conn, &ConfigDefaults::default()).unwrap();

        conn.execute(
            "UPDATE configs SET value = '5' WHERE key = ?1",
            params![CONFIG_FETCH_COUNT],
        )
        .unwrap();
        seed_defaults(&mut conn, &ConfigDefaults::default()).unwrap();

        let value: String = conn
            .query_row(
                "SELECT value FROM configs WHERE key = ?1",
                params![CONFIG_FETCH_COUNT],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(value, "5");

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM configs", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 3);
    }
}
