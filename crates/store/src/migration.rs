//! Schema migration logic for the key-value store
//!
//! Tracks applied migrations and applies pending ones up to the current schema version.

use crate::error::{Error, Result};
use crate::schema::{KV_ENTRIES_SQL, SCHEMA_VERSION, SCHEMA_VERSION_SQL};
use rusqlite::Connection;
use tracing::{debug, info, trace};

/// Manages schema migrations for the key-value store
pub struct MigrationManager;

impl MigrationManager {
    /// Get the current schema version from the database
    ///
    /// Returns 0 if the schema_version table doesn't exist or is empty.
    pub fn get_current_version(conn: &Connection) -> Result<i32> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(format!("Failed to check schema_version table: {e}")))?;

        if !table_exists {
            trace!("schema_version table does not exist, returning version 0");
            return Ok(0);
        }

        let version: Option<i32> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to query schema version: {e}")))?;

        Ok(version.unwrap_or(0))
    }

    /// Apply pending migrations up to SCHEMA_VERSION
    ///
    /// Idempotent. A database written by a newer build is rejected rather than downgraded.
    pub fn migrate(conn: &Connection) -> Result<()> {
        let current_version = Self::get_current_version(conn)?;
        debug!(current_version, target = SCHEMA_VERSION, "Checking schema version");

        if current_version > SCHEMA_VERSION {
            return Err(Error::database(format!(
                "database schema version {current_version} is newer than supported version {SCHEMA_VERSION}"
            )));
        }

        if current_version == SCHEMA_VERSION {
            trace!("Schema is up to date, no migration needed");
            return Ok(());
        }

        info!(from = current_version, to = SCHEMA_VERSION, "Migrating schema");

        if current_version == 0 {
            Self::apply_v1_migration(conn)?;
        }

        info!("Schema migration complete");
        Ok(())
    }

    fn apply_v1_migration(conn: &Connection) -> Result<()> {
        debug!("Applying v1 migration");

        conn.execute_batch(&format!(
            "BEGIN;\n{SCHEMA_VERSION_SQL}\n{KV_ENTRIES_SQL}\nINSERT INTO schema_version (version) VALUES (1);\nCOMMIT;"
        ))
        .map_err(|e| Error::database(format!("Failed to apply v1 schema: {e}")))?;

        trace!("v1 migration applied successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_get_current_version_fresh_db() {
        let conn = Connection::open_in_memory().unwrap();
        let version = MigrationManager::get_current_version(&conn).unwrap();
        assert_eq!(version, 0);
    }

    #[test]
    fn test_migrate_applies_schema_and_sets_version() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::migrate(&conn).unwrap();

        let version = MigrationManager::get_current_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);

        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='kv_entries')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(table_exists);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        MigrationManager::migrate(&conn).unwrap();
        let version1 = MigrationManager::get_current_version(&conn).unwrap();

        MigrationManager::migrate(&conn).unwrap();
        let version2 = MigrationManager::get_current_version(&conn).unwrap();

        assert_eq!(version1, version2);
        assert_eq!(version2, SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_rejects_newer_schema() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::migrate(&conn).unwrap();
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [SCHEMA_VERSION + 1])
            .unwrap();

        let err = MigrationManager::migrate(&conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }
}
