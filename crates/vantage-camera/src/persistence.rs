//! Key/value persistence for bookmarks and motion presets
//!
//! Collections are stored as a versioned JSON envelope
//! `{"version": N, "presets": [...]}`. Older documents are migrated item by
//! item on load; newer ones are rejected at the boundary.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::StorageError;

/// Current envelope version written by this crate
pub const ENVELOPE_VERSION: u32 = 2;

/// Storage key for camera bookmarks
pub const BOOKMARKS_KEY: &str = "camera-bookmarks";
/// Storage key for motion presets
pub const MOTION_PRESETS_KEY: &str = "motion-presets";

/// Minimal key/value storage used by the persistence helpers
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store, used by tests and headless hosts
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails, for exercising degraded paths
    pub fn unavailable() -> Self {
        Self {
            entries: HashMap::new(),
            unavailable: true,
        }
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unavailable {
            Err(StorageError::Unavailable("memory store disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check()?;
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.check()?;
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the user's local data directory, e.g. `~/.local/share/vantage`
    pub fn default_location() -> Option<Self> {
        dirs::data_local_dir().map(|dir| Self::new(dir.join("vantage")))
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StorageError::Io(key.to_string(), e))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|e| StorageError::Io(key.to_string(), e))?;
        let path = self.path(key);
        fs::write(&path, value).map_err(|e| StorageError::Io(key.to_string(), e))?;
        info!("Saved {} to {:?}", key, path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StorageError::Io(key.to_string(), e))?;
        }
        Ok(())
    }
}

/// Sanitize a key into a valid filename
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>()
        .to_lowercase()
}

/// Versioned container for a persisted collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub presets: Vec<T>,
}

/// Per-item upgrade of documents written by older envelope versions
pub trait Migrate {
    /// Rewrite `item` in place from `from_version` to the current layout
    fn migrate(_item: &mut Value, _from_version: u32) {}
}

/// Copy `from` into `field` when `field` is absent or null
pub fn backfill_field(item: &mut Value, field: &str, from: &str) {
    let Some(object) = item.as_object_mut() else {
        return;
    };
    let missing = object.get(field).map_or(true, Value::is_null);
    if missing {
        if let Some(source) = object.get(from).cloned() {
            object.insert(field.to_string(), source);
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    presets: &'a [T],
}

pub fn encode_envelope<T: Serialize>(items: &[T]) -> Result<String, StorageError> {
    let envelope = EnvelopeRef {
        version: ENVELOPE_VERSION,
        presets: items,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

pub fn decode_envelope<T: DeserializeOwned + Migrate>(json: &str) -> Result<Vec<T>, StorageError> {
    let document: Value = serde_json::from_str(json)?;
    let found = document.get("version").and_then(Value::as_u64).unwrap_or(1);
    let version = u32::try_from(found)
        .ok()
        .filter(|v| *v <= ENVELOPE_VERSION)
        .ok_or(StorageError::UnsupportedVersion {
            found,
            supported: ENVELOPE_VERSION,
        })?;

    let items = match document.get("presets") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|mut item| {
            if version < ENVELOPE_VERSION {
                T::migrate(&mut item, version);
            }
            serde_json::from_value(item).map_err(StorageError::from)
        })
        .collect()
}

/// Load a collection, degrading to an empty list on any storage failure
pub fn load_collection<T: DeserializeOwned + Migrate>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let result = store
        .read(key)
        .and_then(|json| json.map_or(Ok(Vec::new()), |json| decode_envelope(&json)));
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!("Failed to load '{}': {}, using an empty collection", key, e);
            Vec::new()
        }
    }
}

/// Save a collection; failures are logged and reported as `false`
pub fn save_collection<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, items: &[T]) -> bool {
    match encode_envelope(items).and_then(|json| store.write(key, &json)) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to save '{}': {}", key, e);
            false
        }
    }
}
