use rusqlite::Connection;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create store directory: {0}")]
    DirectoryError(String),
    #[error("Failed to serialize value for key '{0}': {1}")]
    SerializeError(String, String),
}

/// Raw text persistence under a named key. The application only ever reads
/// and writes whole values; there is no partial write path.
pub trait StoreBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// SQLite-backed key-value storage: one `kv` table, one row per key.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (or create) the store database and initialize the schema
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        let backend = SqliteBackend { conn };
        backend.initialize_schema()?;
        Ok(backend)
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let backend = SqliteBackend { conn };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl StoreBackend for SqliteBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(rusqlite::params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::from(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(())
    }
}

/// HashMap-backed storage for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryBackend {
    map: RefCell<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.map.borrow_mut().remove(key);
        Ok(())
    }
}

type ChangeListener = Box<dyn Fn(&str)>;

/// The record store: typed, insertion-ordered collections persisted as JSON
/// text under named keys.
///
/// Reads follow a parse-or-empty contract: an absent key, invalid JSON, or
/// JSON of the wrong shape all decode to the empty collection (or the type's
/// default for object-shaped keys). A corrupted value degrades to "no data",
/// it never reaches callers as an error.
pub struct Store {
    backend: Box<dyn StoreBackend>,
    listeners: RefCell<Vec<(String, ChangeListener)>>,
}

impl Store {
    pub fn new(backend: Box<dyn StoreBackend>) -> Self {
        Store {
            backend,
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Open a durable store at the given database path
    pub fn open(path: &str) -> Result<Self, StoreError> {
        Ok(Store::new(Box::new(SqliteBackend::open(path)?)))
    }

    /// Store backed by a plain HashMap, for tests
    pub fn in_memory() -> Self {
        Store::new(Box::new(MemoryBackend::new()))
    }

    /// Load the collection stored under `key`, or empty if absent/corrupt
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.backend.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Load an object-shaped record, or its default if absent/corrupt.
    /// Missing fields fall back to their serde defaults, so stored settings
    /// merge over a default object.
    pub fn load_object<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.backend.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
            _ => T::default(),
        }
    }

    /// Serialize and overwrite the whole collection under `key`
    pub fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)
            .map_err(|e| StoreError::SerializeError(key.to_string(), e.to_string()))?;
        self.backend.set(key, &raw)?;
        self.notify(key);
        Ok(())
    }

    /// Serialize and overwrite an object-shaped record under `key`
    pub fn save_object<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StoreError::SerializeError(key.to_string(), e.to_string()))?;
        self.backend.set(key, &raw)?;
        self.notify(key);
        Ok(())
    }

    /// Drop the value stored under `key`
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.backend.remove(key)?;
        self.notify(key);
        Ok(())
    }

    /// Register a callback invoked after every successful write to `key`.
    /// This is the change-notification seam the activity feed subscribes to;
    /// interval polling is only a fallback on top of it.
    pub fn on_change<F: Fn(&str) + 'static>(&self, key: &str, callback: F) {
        self.listeners
            .borrow_mut()
            .push((key.to_string(), Box::new(callback)));
    }

    fn notify(&self, key: &str) {
        for (watched, callback) in self.listeners.borrow().iter() {
            if watched == key {
                callback(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Rec {
        id: String,
        n: i64,
    }

    fn rec(id: &str, n: i64) -> Rec {
        Rec { id: id.into(), n }
    }

    #[test]
    fn absent_key_loads_empty() {
        let store = Store::in_memory();
        let items: Vec<Rec> = store.load("nothing_here");
        assert!(items.is_empty());
    }

    #[test]
    fn save_load_round_trip_preserves_order() {
        let store = Store::in_memory();
        let items = vec![rec("b", 2), rec("a", 1), rec("c", 3)];
        store.save("recs", &items).unwrap();
        let loaded: Vec<Rec> = store.load("recs");
        assert_eq!(loaded, items);
    }

    #[test]
    fn save_is_idempotent() {
        let store = Store::in_memory();
        let items = vec![rec("a", 1)];
        store.save("recs", &items).unwrap();
        store.save("recs", &items).unwrap();
        let loaded: Vec<Rec> = store.load("recs");
        assert_eq!(loaded, items);
    }

    #[test]
    fn malformed_json_loads_empty() {
        let store = Store::in_memory();
        store.backend.set("recs", "{not json").unwrap();
        let items: Vec<Rec> = store.load("recs");
        assert!(items.is_empty());
    }

    #[test]
    fn non_array_json_loads_empty() {
        let store = Store::in_memory();
        store.backend.set("recs", "{\"foreign\": true}").unwrap();
        let items: Vec<Rec> = store.load("recs");
        assert!(items.is_empty());
    }

    #[test]
    fn wrong_shape_array_loads_empty() {
        let store = Store::in_memory();
        store.backend.set("recs", "[{\"id\": 42}]").unwrap();
        let items: Vec<Rec> = store.load("recs");
        assert!(items.is_empty());
    }

    #[test]
    fn object_key_falls_back_to_default() {
        #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
        struct Settings {
            #[serde(default)]
            flag: bool,
        }
        let store = Store::in_memory();
        assert_eq!(store.load_object::<Settings>("settings"), Settings::default());
        store.backend.set("settings", "broken").unwrap();
        assert_eq!(store.load_object::<Settings>("settings"), Settings::default());
    }

    #[test]
    fn change_listener_fires_on_save() {
        let store = Store::in_memory();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        store.on_change("recs", move |_| counter.set(counter.get() + 1));
        store.save("recs", &[rec("a", 1)]).unwrap();
        store.save("other", &[rec("b", 2)]).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn sqlite_backend_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let path = path.to_str().unwrap();
        {
            let store = Store::open(path).unwrap();
            store.save("recs", &[rec("a", 1)]).unwrap();
        }
        let store = Store::open(path).unwrap();
        let loaded: Vec<Rec> = store.load("recs");
        assert_eq!(loaded, vec![rec("a", 1)]);
    }
}
