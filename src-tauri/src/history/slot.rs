use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::error::DetectorError;

/// Durable key-value storage for small JSON documents.
pub trait HistorySlot: Send {
    /// `Ok(None)` when nothing has been stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, DetectorError>;
    fn save(&self, key: &str, value: &str) -> Result<(), DetectorError>;
}

/// SQLite-backed slot. One row per key.
/// All operations are synchronous (rusqlite is blocking).
pub struct SqliteSlot {
    conn: Connection,
}

impl SqliteSlot {
    /// Open or create the database at `db_path`, creating parent directories.
    /// Typically called with: app.path().app_data_dir()?.join("history.db")
    pub fn open(db_path: &Path) -> Result<Self, DetectorError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DetectorError::Storage(format!("Failed to create data dir: {}", e))
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| {
            DetectorError::Storage(format!("Failed to open history db at {:?}: {}", db_path, e))
        })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| DetectorError::Storage(format!("Failed to create kv table: {}", e)))?;

        info!("Opened history database at {:?}", db_path);
        Ok(Self { conn })
    }

    /// RFC 3339 timestamp of the last write to `key`.
    pub fn updated_at(&self, key: &str) -> Result<Option<String>, DetectorError> {
        self.conn
            .query_row(
                "SELECT updated_at FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DetectorError::Storage(format!("Failed to read timestamp: {}", e)))
    }
}

impl HistorySlot for SqliteSlot {
    fn load(&self, key: &str) -> Result<Option<String>, DetectorError> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DetectorError::Storage(format!("Failed to read '{}': {}", key, e)))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), DetectorError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| DetectorError::Storage(format!("Failed to write '{}': {}", key, e)))?;
        Ok(())
    }
}

/// In-memory slot. Clones share the same map, so a test can keep a handle
/// and inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    values: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with `value` under `key`.
    pub fn with_value(key: &str, value: &str) -> Self {
        let slot = Self::new();
        if let Ok(mut values) = slot.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        slot
    }

    /// Make every following `save` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }
}

impl HistorySlot for MemorySlot {
    fn load(&self, key: &str) -> Result<Option<String>, DetectorError> {
        let values = self
            .values
            .lock()
            .map_err(|_| DetectorError::Storage("Memory slot poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), DetectorError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DetectorError::Storage("Memory slot is read-only".to_string()));
        }
        let mut values = self
            .values
            .lock()
            .map_err(|_| DetectorError::Storage("Memory slot poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sqlite_slot_round_trip() {
        let dir = TempDir::new().unwrap();
        let slot = SqliteSlot::open(&dir.path().join("history.db")).unwrap();

        assert_eq!(slot.load("analysisHistory").unwrap(), None);
        slot.save("analysisHistory", "[\"a\"]").unwrap();
        slot.save("analysisHistory", "[\"b\",\"a\"]").unwrap();
        assert_eq!(
            slot.load("analysisHistory").unwrap().as_deref(),
            Some("[\"b\",\"a\"]")
        );

        let stamp = slot.updated_at("analysisHistory").unwrap().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }

    #[test]
    fn test_sqlite_slot_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data").join("history.db");
        let slot = SqliteSlot::open(&path).unwrap();
        slot.save("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_memory_slot_shares_state_between_clones() {
        let slot = MemorySlot::new();
        let handle = slot.clone();
        slot.save("k", "v").unwrap();
        assert_eq!(handle.get("k").as_deref(), Some("v"));

        handle.fail_writes(true);
        assert!(slot.save("k", "w").is_err());
        assert_eq!(slot.get("k").as_deref(), Some("v"));
    }
}
