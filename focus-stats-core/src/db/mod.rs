//! SQLite persistence for the stats cache
//!
//! A single `kv_entries` table backs the [`KvStore`] slot interface, so the
//! cache survives across process runs.

pub mod schema;

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::cache::KvStore;
use crate::error::{Result, StorageError};

/// Key-value store backed by SQLite
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    max_bytes: Option<usize>,
}

impl SqliteStore {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            max_bytes: None,
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            max_bytes: None,
        })
    }

    /// Cap the total key and value bytes stored across all slots
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)?;
        Ok(())
    }

    /// Number of stored slots
    pub fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM kv_entries", [], |r| r.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Backend("database lock poisoned".to_string()))
    }
}

/// Map SQLite's "database or disk is full" to a quota failure.
fn classify(error: rusqlite::Error, needed: usize, limit: usize) -> StorageError {
    match error {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::DiskFull => {
            StorageError::QuotaExceeded { needed, limit }
        }
        other => StorageError::Database(other),
    }
}

/// Byte budget SQLite itself enforces via `max_page_count`.
fn page_budget(conn: &Connection) -> usize {
    let pages: i64 = conn
        .query_row("PRAGMA max_page_count", [], |r| r.get(0))
        .unwrap_or(0);
    let page_size: i64 = conn
        .query_row("PRAGMA page_size", [], |r| r.get(0))
        .unwrap_or(0);
    pages.saturating_mul(page_size).max(0) as usize
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        let conn = self.lock()?;

        if let Some(limit) = self.max_bytes {
            let others: i64 = conn.query_row(
                "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
                 FROM kv_entries WHERE key != ?1",
                params![key],
                |row| row.get(0),
            )?;
            let needed = others as usize + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        conn.execute(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, Utc::now().to_rfc3339()],
        )
        .map_err(|e| {
            let limit = self.max_bytes.unwrap_or_else(|| page_budget(&conn));
            classify(e, key.len() + value.len(), limit)
        })?;

        Ok(())
    }

    fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
        Ok(())
    }
}
