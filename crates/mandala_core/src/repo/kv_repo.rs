//! Key/value persistence contract and SQLite implementation.
//!
//! # Responsibility
//! - Store whole-state JSON documents under namespaced string keys.
//! - Keep SQL details behind the `KeyValueStore` boundary.
//!
//! # Invariants
//! - One row per key; `save` replaces the previous value.
//! - Values are opaque text; decoding belongs to callers.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by key/value store operations.
pub type KvResult<T> = Result<T, KvRepoError>;

/// Errors from key/value store operations.
#[derive(Debug)]
pub enum KvRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Key is blank after trim.
    InvalidKey,
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for KvRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey => write!(f, "storage key must not be blank"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "key/value store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "key/value store requires table `{table}`")
            }
        }
    }
}

impl Error for KvRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for KvRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for KvRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence collaborator for whole-state documents.
pub trait KeyValueStore {
    /// Loads the value stored under `key`, if any.
    fn load(&self, key: &str) -> KvResult<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> KvResult<()>;
    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> KvResult<()>;
}

/// SQLite-backed key/value store.
pub struct SqliteKeyValueStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKeyValueStore<'conn> {
    /// Creates store from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> KvResult<Self> {
        ensure_kv_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKeyValueStore<'_> {
    fn load(&self, key: &str) -> KvResult<Option<String>> {
        let key = normalize_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT entry_value
                 FROM kv_entries
                 WHERE entry_key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> KvResult<()> {
        let key = normalize_key(key)?;
        self.conn.execute(
            "INSERT INTO kv_entries (entry_key, entry_value)
             VALUES (?1, ?2)
             ON CONFLICT(entry_key) DO UPDATE SET
                 entry_value = excluded.entry_value,
                 updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> KvResult<()> {
        let key = normalize_key(key)?;
        self.conn
            .execute("DELETE FROM kv_entries WHERE entry_key = ?1;", [key])?;
        Ok(())
    }
}

fn normalize_key(key: &str) -> KvResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(KvRepoError::InvalidKey);
    }
    Ok(trimmed)
}

fn ensure_kv_connection_ready(conn: &Connection) -> KvResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(KvRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'kv_entries'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(KvRepoError::MissingRequiredTable("kv_entries"));
    }
    Ok(())
}
