//! SQLite Key-Value Store
//!
//! One `settings(key, value, updated_at)` table behind an r2d2 pool. Values
//! are opaque strings; `LocalCache` layers typed JSON on top.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

use crate::utils::error::{AppError, AppResult};

type Connection = PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connections", &self.pool.state().connections)
            .finish()
    }
}

impl Database {
    /// In-memory store for tests. The pool holds a single connection so every
    /// caller sees the same database.
    pub fn new_in_memory() -> AppResult<Self> {
        Self::with_manager(SqliteConnectionManager::memory(), 1)
    }

    /// Open (or create) the store at `db_path`
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Several CLI processes may share the file
        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
            conn.busy_timeout(std::time::Duration::from_secs(5))
        });
        Self::with_manager(manager, 4)
    }

    fn with_manager(manager: SqliteConnectionManager, max_size: u32) -> AppResult<Self> {
        let pool = Pool::builder()
            .max_size(max_size)
            .build(manager)
            .map_err(|e| AppError::database(format!("Failed to create connection pool: {}", e)))?;
        let db = Self { pool };
        db.connection()?.execute(SCHEMA, [])?;
        Ok(db)
    }

    fn connection(&self) -> AppResult<Connection> {
        self.pool
            .get()
            .map_err(|e| AppError::database(format!("Failed to get connection: {}", e)))
    }

    pub fn is_healthy(&self) -> bool {
        self.connection()
            .map(|conn| conn.query_row("SELECT 1", [], |_| Ok(())).is_ok())
            .unwrap_or(false)
    }

    pub fn get_setting(&self, key: &str) -> AppResult<Option<String>> {
        let value = self
            .connection()?
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a value
    pub fn set_setting(&self, key: &str, value: &str) -> AppResult<()> {
        self.connection()?.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> AppResult<()> {
        self.connection()?
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Delete every key starting with `prefix`; returns the number removed.
    ///
    /// Matched literally; `_` and `%` in the prefix are not wildcards.
    pub fn delete_prefixed(&self, prefix: &str) -> AppResult<usize> {
        let removed = self.connection()?.execute(
            "DELETE FROM settings WHERE substr(key, 1, length(?1)) = ?1",
            params![prefix],
        )?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_is_healthy() {
        let db = Database::new_in_memory().unwrap();
        assert!(db.is_healthy());
    }

    #[test]
    fn test_upsert_and_delete() {
        let db = Database::new_in_memory().unwrap();
        assert!(db.get_setting("token").unwrap().is_none());

        db.set_setting("token", "abc").unwrap();
        db.set_setting("token", "def").unwrap();
        assert_eq!(db.get_setting("token").unwrap().as_deref(), Some("def"));

        db.delete_setting("token").unwrap();
        assert!(db.get_setting("token").unwrap().is_none());
    }

    #[test]
    fn test_prefix_is_literal() {
        let db = Database::new_in_memory().unwrap();
        db.set_setting("workflow_analysis", "{}").unwrap();
        db.set_setting("workflow_mao_inputs", "{}").unwrap();
        db.set_setting("workflowXstale", "{}").unwrap();
        db.set_setting("selected_property", "{}").unwrap();

        assert_eq!(db.delete_prefixed("workflow_").unwrap(), 2);
        assert!(db.get_setting("workflowXstale").unwrap().is_some());
        assert!(db.get_setting("selected_property").unwrap().is_some());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("data.db");
        {
            let db = Database::open(&path).unwrap();
            db.set_setting("token", "persisted").unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_setting("token").unwrap().as_deref(), Some("persisted"));
    }
}
