use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use peditor_core::KeyValueStore;
use peditor_core::logging::sanitize_path;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument, trace};

use crate::error::{Error, Result};
use crate::migration::MigrationManager;

/// Summary of what the store holds
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    pub entries: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// SQLite-backed key-value store.
///
/// Cloning shares the underlying connection. Writes are synchronous; each `set` is a single
/// upsert.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueStore {
    /// Open or create a store at the given path, creating parent directories as needed.
    #[instrument(skip_all, fields(db_path = %sanitize_path(db_path)))]
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("Opening key-value store");

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path).map_err(|e| Error::database(format!("Failed to open database: {e}")))?;
        Self::from_connection(conn)
    }

    /// Store that lives only as long as the process
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        debug!("Running migrations");
        MigrationManager::migrate(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::LockPoisoned)
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        trace!(key, "Reading value");
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT value FROM kv_entries WHERE key = ?1")?;
        let value = stmt.query_row(params![key], |row| row.get(0)).optional()?;
        Ok(value)
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        trace!(key, bytes = value.len(), "Writing value");
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )?;
        stmt.execute(params![key, value, Utc::now().to_rfc3339()])?;
        Ok(())
    }

    /// Returns true when a value was removed
    pub fn remove_value(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// All keys, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached("SELECT key FROM kv_entries ORDER BY key")?;
        let keys = stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }

    /// When `key` was last written
    pub fn updated_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row("SELECT updated_at FROM kv_entries WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        raw.map(|s| parse_timestamp(&s)).transpose()
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock()?;
        let (entries, last): (i64, Option<String>) =
            conn.query_row("SELECT COUNT(*), MAX(updated_at) FROM kv_entries", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
        let last_updated = last.map(|s| parse_timestamp(&s)).transpose()?;
        Ok(StoreStats { entries: entries as usize, last_updated })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::database(format!("Invalid timestamp '{raw}': {e}")))
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> peditor_core::Result<Option<String>> {
        Ok(self.get_value(key)?)
    }

    fn set(&self, key: &str, value: &str) -> peditor_core::Result<()> {
        Ok(self.set_value(key, value)?)
    }

    fn remove(&self, key: &str) -> peditor_core::Result<()> {
        self.remove_value(key)?;
        Ok(())
    }
}
