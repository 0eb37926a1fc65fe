//! SQLite schema for the key-value store

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create the schema version table
pub const SCHEMA_VERSION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQL to create the key-value table
///
/// Values are JSON documents written by the settings and history layers; `updated_at` is an
/// RFC 3339 timestamp set by the store on every write.
pub const KV_ENTRIES_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv_entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
