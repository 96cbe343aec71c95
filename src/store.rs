use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Narrow, key-addressed storage contract shared by every consumer.
///
/// Values are whole-collection JSON payloads; writes replace the payload
/// for a key in one step. Managers take `&mut dyn Store` so tests can
/// substitute [`MemoryStore`] for the durable workspace store.
pub trait Store {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove_item(&mut self, key: &str) -> anyhow::Result<()>;
}

/// Durable store backed by a single key/value table in the workspace
/// database.
pub struct SqliteStore {
    conn: Connection,
}

pub fn open_store(workspace: &Path) -> anyhow::Result<SqliteStore> {
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create workspace {}", workspace.to_string_lossy()))?;
    let db_path = workspace.join("scoresafe.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(SqliteStore { conn })
}

impl Store for SqliteStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |r| {
                r.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.conn.execute(
            "INSERT INTO kv(key, value) VALUES(?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }
}

/// In-memory store for unit tests.
#[derive(Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> anyhow::Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Reads the collection stored under `key`. A missing key reads as an
/// empty collection, and so does a malformed payload: the store favors
/// availability over failing loudly on corrupt persisted data.
pub fn read_collection<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Vec<T> {
    match store.get_item(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Replaces the whole collection stored under `key`.
pub fn write_collection<T: Serialize>(
    store: &mut dyn Store,
    key: &str,
    items: &[T],
) -> anyhow::Result<()> {
    let raw = serde_json::to_string(items)?;
    store.set_item(key, &raw)
}
