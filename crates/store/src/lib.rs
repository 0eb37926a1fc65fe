//! SQLite persistence for PEditor settings and histories
//!
//! Implements the core [`KeyValueStore`](peditor_core::KeyValueStore) capability on top of a
//! single versioned table.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use peditor_core::{HistoryStore, SharedStore};
//! use peditor_store::SqliteKeyValueStore;
//!
//! let kv: SharedStore = Arc::new(SqliteKeyValueStore::open(std::path::Path::new("peditor.db"))?);
//! let histories = HistoryStore::load(kv)?;
//! histories.edit_input("Draft to polish");
//! # Ok::<(), peditor_core::Error>(())
//! ```

mod error;
mod kv_store;
mod migration;
mod schema;

pub use error::{Error, Result};
pub use kv_store::{SqliteKeyValueStore, StoreStats};
pub use migration::MigrationManager;
pub use schema::SCHEMA_VERSION;
