use crate::errors::AppError;
use crate::models::RoadmapStore;
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tracing::{debug, error, warn};

/// Synchronous string key-value storage, the shape of a browser's local storage.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), AppError>;
}

/// One file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and writes the whole [`RoadmapStore`] under a single key.
#[derive(Clone)]
pub struct StoreAdapter {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl StoreAdapter {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Never fails: a missing, unreadable or unparseable value is the empty document.
    pub fn load(&self) -> RoadmapStore {
        let text = match self.backend.get_item(&self.key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!(key = %self.key, "no stored document, starting empty");
                return RoadmapStore::default();
            }
            Err(err) => {
                error!(key = %self.key, "failed to read stored document: {err}");
                return RoadmapStore::default();
            }
        };

        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => RoadmapStore::from_value(value),
            Err(err) => {
                warn!(key = %self.key, "failed to parse stored document: {err}");
                RoadmapStore::default()
            }
        }
    }

    /// Overwrites the stored value with the full document.
    pub fn save(&self, store: &RoadmapStore) -> Result<(), AppError> {
        let payload = serde_json::to_string_pretty(&store.to_value())?;
        self.backend.set_item(&self.key, &payload)
    }

    #[cfg(test)]
    fn raw(&self) -> Result<Option<String>, AppError> {
        self.backend.get_item(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhaseId;
    use serde_json::json;

    fn memory_adapter() -> (Arc<MemoryStore>, StoreAdapter) {
        let backend = Arc::new(MemoryStore::new());
        let adapter = StoreAdapter::new(backend.clone(), "roadmapData");
        (backend, adapter)
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("roadmap_tracker_{tag}_{}_{nanos}", std::process::id()));
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn load_missing_is_empty() {
        let (_, adapter) = memory_adapter();
        assert_eq!(adapter.load(), RoadmapStore::default());
    }

    #[test]
    fn load_garbage_is_empty() {
        let (backend, adapter) = memory_adapter();
        backend.set_item("roadmapData", "{not json").unwrap();
        assert_eq!(adapter.load(), RoadmapStore::default());

        backend.set_item("roadmapData", "null").unwrap();
        assert_eq!(adapter.load(), RoadmapStore::default());
    }

    #[test]
    fn save_of_load_is_stable() {
        let (backend, adapter) = memory_adapter();
        let seeded = json!({
            "phase": "ADV_ANALYST",
            "streak": 2,
            "2024-05-01": { "completed": { "1": true }, "hours": 0.7 },
            "2024-05-02": { "completed": {}, "hours": 0 },
            "notes": ["keep me"]
        });
        backend
            .set_item("roadmapData", &seeded.to_string())
            .unwrap();

        adapter.save(&adapter.load()).unwrap();
        let first = adapter.raw().unwrap().unwrap();
        adapter.save(&adapter.load()).unwrap();
        let second = adapter.raw().unwrap().unwrap();
        assert_eq!(first, second);

        let reloaded = adapter.load();
        assert_eq!(reloaded.phase, Some(PhaseId::AdvAnalyst));
        assert_eq!(reloaded.streak, Some(2));
        assert_eq!(reloaded.extra.get("notes"), Some(&json!(["keep me"])));
    }

    #[test]
    fn file_store_round_trips_and_reports_missing() {
        let dir = temp_dir("file_store");
        let store = FileStore::new(&dir);

        assert_eq!(store.get_item("roadmapData").unwrap(), None);
        store.set_item("roadmapData", "{\"streak\":1}").unwrap();
        assert_eq!(
            store.get_item("roadmapData").unwrap().as_deref(),
            Some("{\"streak\":1}")
        );
        assert!(dir.join("roadmapData.json").exists());
        assert!(!dir.join("roadmapData.json.tmp").exists());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn file_store_keys_stay_inside_dir() {
        let store = FileStore::new("/tmp/data");
        assert_eq!(
            store.path_for("../escape"),
            PathBuf::from("/tmp/data/___escape.json")
        );
    }
}
