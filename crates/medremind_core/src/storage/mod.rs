//! Key-value persistence collaborator.
//!
//! # Responsibility
//! - Define the string-keyed blob contract the reminder store persists through.
//! - Provide SQLite-backed and in-memory implementations.
//!
//! # Invariants
//! - `set` replaces the whole value for a key; readers never observe a
//!   partially written value.
//! - Implementations are shareable across threads (`Send + Sync`).

use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
pub mod migrations;
mod sqlite;

pub use memory::MemoryKeyValueStore;
pub use sqlite::{open_db, open_db_in_memory, SqliteKeyValueStore};

pub type StorageResult<T> = Result<T, StorageError>;

/// Transport-level storage failures.
#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Backend lock was poisoned by a panicking writer.
    Unavailable(&'static str),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Unavailable(details) => write!(f, "storage unavailable: {details}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// String-keyed blob storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Removes a key; removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}
