//! Local persistence for conversation snapshots and preferences.
//!
//! A [`KvStore`] is a plain string key-value store; [`StateStore`] layers
//! JSON (de)serialization and failure containment on top. Storage failures
//! never reach the session: reads fall back to the caller's default and
//! writes are logged and dropped, leaving in-memory state authoritative.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ChatError;

/// Key holding the persisted conversation-summary snapshot.
pub const CONVERSATIONS_KEY: &str = "conversations";
/// Key holding the theme preference.
pub const THEME_KEY: &str = "theme";
/// Key holding the settings object.
pub const SETTINGS_KEY: &str = "settings";

/// A string key-value store.
pub trait KvStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, ChatError>;
    fn write(&self, key: &str, value: &str) -> Result<(), ChatError>;
    fn remove(&self, key: &str) -> Result<(), ChatError>;
}

/// File-backed store keeping all keys in one JSON object file.
#[derive(Debug)]
pub struct FileStore {
    entries: Mutex<HashMap<String, String>>,
    file_path: PathBuf,
}

impl FileStore {
    /// Open the store at the default location (`~/.aura/state.json`).
    pub fn open() -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not find home directory")
        })?;
        Self::with_path(home_dir.join(".aura").join("state.json"))
    }

    /// Open the store at an explicit path, creating parent directories.
    pub fn with_path(file_path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let store = FileStore {
            entries: Mutex::new(HashMap::new()),
            file_path,
        };

        store.load()?;
        Ok(store)
    }

    fn load(&self) -> io::Result<()> {
        match File::open(&self.file_path) {
            Ok(mut file) => {
                let mut contents = String::new();
                file.read_to_string(&mut contents)?;
                let entries: HashMap<String, String> = serde_json::from_str(&contents)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
                *self.entries.lock().expect("entries lock") = entries;
                Ok(())
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) -> io::Result<()> {
        let contents = serde_json::to_string_pretty(entries)?;
        let mut file = File::create(&self.file_path)?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, ChatError> {
        let entries = self.entries.lock().expect("entries lock");
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let mut entries = self.entries.lock().expect("entries lock");
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
            .map_err(|err| ChatError::StorageError(err.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), ChatError> {
        let mut entries = self.entries.lock().expect("entries lock");
        entries.remove(key);
        self.persist(&entries)
            .map_err(|err| ChatError::StorageError(err.to_string()))
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, ChatError> {
        let entries = self.entries.lock().expect("entries lock");
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ChatError> {
        let mut entries = self.entries.lock().expect("entries lock");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ChatError> {
        let mut entries = self.entries.lock().expect("entries lock");
        entries.remove(key);
        Ok(())
    }
}

/// JSON view over a [`KvStore`] with full failure containment.
#[derive(Clone)]
pub struct StateStore {
    store: Arc<dyn KvStore>,
}

impl StateStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// An in-memory state store, used when no persistence is configured.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Read and parse the value under `key`.
    ///
    /// A missing key, a read failure, or a parse failure all return
    /// `default`; this never fails.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let text = match self.store.read(key) {
            Ok(Some(text)) => text,
            Ok(None) => return default,
            Err(err) => {
                log::warn!("state read failed for {key:?}: {err}");
                return default;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("state parse failed for {key:?}: {err}");
                default
            }
        }
    }

    /// Serialize and write `value` under `key`.
    ///
    /// Failures are logged and swallowed; the caller's in-memory state
    /// stays valid regardless.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("state serialize failed for {key:?}: {err}");
                return;
            }
        };

        if let Err(err) = self.store.write(key, &text) {
            log::warn!("state write failed for {key:?}: {err}");
        }
    }

    /// Remove the value under `key`, swallowing failures.
    pub fn remove(&self, key: &str) {
        if let Err(err) = self.store.remove(key) {
            log::warn!("state remove failed for {key:?}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    fn sample() -> Sample {
        Sample {
            name: "aura".to_string(),
            count: 3,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = StateStore::in_memory();
        store.save("sample", &sample());

        let loaded: Sample = store.load(
            "sample",
            Sample {
                name: String::new(),
                count: 0,
            },
        );
        assert_eq!(loaded, sample());
    }

    #[test]
    fn load_untouched_key_returns_default() {
        let store = StateStore::in_memory();
        let loaded: Vec<String> = store.load("missing", vec!["default".to_string()]);
        assert_eq!(loaded, vec!["default".to_string()]);
    }

    #[test]
    fn load_corrupt_value_returns_default() {
        let raw = MemoryStore::new();
        raw.write("sample", "{not json").unwrap();

        let store = StateStore::new(Arc::new(raw));
        let loaded: Sample = store.load(
            "sample",
            Sample {
                name: "fallback".to_string(),
                count: 0,
            },
        );
        assert_eq!(loaded.name, "fallback");
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = StateStore::new(Arc::new(FileStore::with_path(path.clone()).unwrap()));
            store.save("sample", &sample());
        }

        let reopened = StateStore::new(Arc::new(FileStore::with_path(path).unwrap()));
        let loaded: Sample = store_default(&reopened);
        assert_eq!(loaded, sample());
    }

    fn store_default(store: &StateStore) -> Sample {
        store.load(
            "sample",
            Sample {
                name: String::new(),
                count: 0,
            },
        )
    }

    #[test]
    fn write_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the store expects its parent directory.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let store = FileStore {
            entries: Mutex::new(HashMap::new()),
            file_path: blocker.join("state.json"),
        };
        let state = StateStore::new(Arc::new(store));

        state.save("sample", &sample());
        let loaded: Option<Sample> = state.load("sample", None);
        // The write failed but the in-memory entry survived.
        assert!(loaded.is_some());
    }
}
