//! SQLite-backed session storage
//!
//! A string key/value store with a byte quota. Cache entries and session
//! fields share one store, the way browser session storage holds both.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StorageError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// Default quota, the usual per-origin session storage allowance
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

type Result<T> = std::result::Result<T, StorageError>;

/// Key/value store shared by the cache and the session manager
pub struct SessionStorage {
    conn: Mutex<Connection>,
    quota: u64,
}

impl SessionStorage {
    /// Open or create storage at the default location
    pub fn open(quota: u64) -> Result<Self> {
        let dir = Self::storage_dir()?;
        Self::open_at(&dir.join("session.db"), quota)
    }

    /// Get the storage directory path (~/.cache/siwaras on Linux)
    pub fn storage_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(StorageError::NoCacheDir)?;
        Ok(cache_base.join("siwaras"))
    }

    /// Open storage backed by a specific database file
    pub fn open_at(db_path: &Path, quota: u64) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Io(format!("Failed to create storage dir: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Storage schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            std::fs::remove_file(db_path)
                .map_err(|e| StorageError::Io(format!("Failed to remove storage DB: {}", e)))?;
            return Self::open_at(db_path, quota);
        }

        Self::init(conn, quota)
    }

    /// Open a throwaway in-memory store
    #[cfg(test)]
    pub fn open_in_memory(quota: u64) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, quota)
    }

    fn init(conn: Connection, quota: u64) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
            "#,
        )?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
            quota,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Configured quota in bytes
    pub fn quota(&self) -> u64 {
        self.quota
    }

    /// Read a value
    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write a value, failing with `QuotaExceeded` if it does not fit
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.set_items(&[(key, value)])
    }

    /// Write several values in one transaction; either all land or none do
    pub fn set_items(&self, items: &[(&str, &str)]) -> Result<()> {
        self.update_items(items, &[])
    }

    /// Write `set` and delete `remove` in one transaction
    pub fn update_items(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut needed = used_bytes(&tx)?;
        for key in remove {
            needed = needed.saturating_sub(entry_bytes(&tx, key)?);
        }
        for (key, value) in set {
            needed = needed.saturating_sub(entry_bytes(&tx, key)?);
            needed += (key.len() + value.len()) as u64;
        }
        if needed > self.quota {
            return Err(StorageError::QuotaExceeded {
                needed,
                quota: self.quota,
            });
        }

        for key in remove {
            tx.execute("DELETE FROM storage WHERE key = ?1", [key])?;
        }
        for (key, value) in set {
            tx.execute(
                "INSERT OR REPLACE INTO storage (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove a value; returns whether it existed
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM storage WHERE key = ?1", [key])?;
        Ok(deleted > 0)
    }

    /// Remove several values in one transaction; returns how many existed
    pub fn remove_items<S: AsRef<str>>(&self, keys: &[S]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut deleted = 0;
        for key in keys {
            deleted += tx.execute("DELETE FROM storage WHERE key = ?1", [key.as_ref()])?;
        }
        tx.commit()?;
        Ok(deleted)
    }

    /// All keys starting with `prefix`
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key FROM storage WHERE substr(key, 1, length(?1)) = ?1")?;
        let keys = stmt
            .query_map([prefix], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    /// All key/value pairs whose key starts with `prefix`
    pub fn entries_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT key, value FROM storage WHERE substr(key, 1, length(?1)) = ?1")?;
        let entries = stmt
            .query_map([prefix], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<(String, String)>, _>>()?;
        Ok(entries)
    }

    /// Bytes currently counted against the quota
    pub fn used_bytes(&self) -> Result<u64> {
        let conn = self.lock()?;
        used_bytes(&conn)
    }
}

fn used_bytes(conn: &Connection) -> Result<u64> {
    let used: i64 = conn.query_row(
        "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
         FROM storage",
        [],
        |r| r.get(0),
    )?;
    Ok(used.max(0) as u64)
}

fn entry_bytes(conn: &Connection, key: &str) -> Result<u64> {
    let size: Option<i64> = conn
        .query_row(
            "SELECT LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))
             FROM storage WHERE key = ?1",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(size.unwrap_or(0).max(0) as u64)
}
