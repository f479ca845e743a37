// AiMan Engine — Storage Adapter
// Key-value persistence behind a trait so the stores never care where the
// bytes live. The default backend is a single SQLite table; tests use the
// in-memory adapter.

use crate::atoms::error::CoreResult;
use log::info;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ── Trait ──────────────────────────────────────────────────────────────────

/// Whole-value key-value persistence. Values are opaque serialized strings;
/// every save rewrites the full value under its key.
pub trait StorageAdapter: Send + Sync {
    fn get(&self, key: &str) -> CoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    fn remove(&self, key: &str) -> CoreResult<()>;
}

// ── SQLite backend ─────────────────────────────────────────────────────────

/// Default location for the client database.
pub fn default_db_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_default();
    let dir = home.join(".aiman");
    std::fs::create_dir_all(&dir).ok();
    dir.join("aiman.db")
}

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database and initialize the kv table.
    pub fn open(path: &Path) -> CoreResult<Self> {
        info!("[engine] Opening storage at {:?}", path);
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        Ok(SqliteStorage { conn: Mutex::new(conn) })
    }
}

impl StorageAdapter for SqliteStorage {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ── In-memory backend ──────────────────────────────────────────────────────

/// HashMap-backed adapter for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStorage {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.map.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        self.map.lock().remove(key);
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_roundtrip() {
        let s = MemoryStorage::new();
        assert_eq!(s.get("k").unwrap(), None);
        s.set("k", "v").unwrap();
        assert_eq!(s.get("k").unwrap().as_deref(), Some("v"));
        s.set("k", "v2").unwrap();
        assert_eq!(s.get("k").unwrap().as_deref(), Some("v2"));
        s.remove("k").unwrap();
        assert_eq!(s.get("k").unwrap(), None);
    }

    #[test]
    fn sqlite_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let s = SqliteStorage::open(&path).unwrap();
        s.set("identity", r#"{"uid":"u1"}"#).unwrap();
        assert_eq!(s.get("identity").unwrap().as_deref(), Some(r#"{"uid":"u1"}"#));

        // Reopen — value survives the connection.
        drop(s);
        let s = SqliteStorage::open(&path).unwrap();
        assert_eq!(s.get("identity").unwrap().as_deref(), Some(r#"{"uid":"u1"}"#));
        s.remove("identity").unwrap();
        assert_eq!(s.get("identity").unwrap(), None);
    }
}
