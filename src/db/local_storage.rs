//! Key/value local storage: the durable half of the portal.
//!
//! Only three keys are ever written: the signed-in user (JSON), the UI
//! language tag and the theme tag. `SqliteStorage` keeps them in a single
//! `local_storage` table; `MemoryStorage` is the process-only variant used
//! by tests and ephemeral sessions.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{open_database, open_memory_database, DatabaseError};

/// Storage key for the JSON-serialized current user.
pub const USER_KEY: &str = "saludcerca.user";
/// Storage key for the two-letter language tag.
pub const LANGUAGE_KEY: &str = "saludcerca.language";
/// Storage key for the theme tag.
pub const THEME_KEY: &str = "saludcerca.theme";

/// String key/value store with local-storage semantics.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    /// Insert or overwrite.
    fn set_item(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), DatabaseError>;
}

/// Read a JSON value. A malformed payload is reported, not silently dropped.
pub fn get_json<T: DeserializeOwned>(
    storage: &dyn LocalStorage,
    key: &str,
) -> Result<Option<T>, DatabaseError> {
    match storage.get_item(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn set_json<T: Serialize>(
    storage: &dyn LocalStorage,
    key: &str,
    value: &T,
) -> Result<(), DatabaseError> {
    let raw = serde_json::to_string(value)?;
    storage.set_item(key, &raw)
}

// ═══════════════════════════════════════════════════════════
// SQLite-backed storage
// ═══════════════════════════════════════════════════════════

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = open_database(path)?;
        tracing::debug!(path = %path.display(), "Local storage opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self {
            conn: Mutex::new(open_memory_database()?),
        })
    }
}

impl LocalStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let mut stmt = conn.prepare("SELECT value FROM local_storage WHERE key = ?1")?;
        match stmt.query_row([key], |row| row.get::<_, String>(0)) {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO local_storage (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        conn.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory storage
// ═══════════════════════════════════════════════════════════

#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let items = self.items.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let mut items = self.items.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), DatabaseError> {
        let mut items = self.items.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        items.remove(key);
        Ok(())
    }
}
