//! Error types for the key-value store

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the key-value store
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database corruption or schema mismatch
    #[error("Database error: {0}")]
    Database(String),

    /// The connection mutex was poisoned by a panicking writer
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Create a database error with a message
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }
}

impl From<Error> for peditor_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => peditor_core::Error::Io(e),
            other => peditor_core::Error::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::database("schema too new");
        assert_eq!(err.to_string(), "Database error: schema too new");
        assert_eq!(Error::LockPoisoned.to_string(), "Connection lock poisoned");
    }

    #[test]
    fn test_error_from_sqlite() {
        let sqlite_err = rusqlite::Error::InvalidPath("test path".into());
        let err: Error = sqlite_err.into();
        assert!(matches!(err, Error::Sqlite(_)));
    }

    #[test]
    fn test_into_core_error() {
        let core: peditor_core::Error = Error::database("broken").into();
        assert!(matches!(core, peditor_core::Error::Store(_)));
        assert_eq!(core.to_string(), "store error: Database error: broken");

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let core: peditor_core::Error = Error::Io(io).into();
        assert!(matches!(core, peditor_core::Error::Io(_)));
    }
}
