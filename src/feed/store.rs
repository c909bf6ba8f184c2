use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use crate::error::{Error, Result};

// Snapshot key layout. No schema versioning; a format change needs a new
// prefix or a migration pass.
pub const KEY_PREFIX: &str = "silverfeed";
pub const GLOBAL_SNAPSHOT_KEY: &str = "silverfeed.spot.global";
pub const REGIONAL_SNAPSHOT_KEY: &str = "silverfeed.spot.shanghai";
pub const HISTORY_KEY: &str = "silverfeed.history.24h";

/// Keyed snapshot storage. Writes are fire-and-forget at the call sites;
/// a failed write degrades to memory-only caching for that cycle.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// One JSON file per key under a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(JsonFileStore { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::StorageRead {
                key: key.to_string(),
                detail: e.to_string(),
            }),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::write(self.path_for(key), value).map_err(|e| Error::StorageWrite {
            key: key.to_string(),
            detail: e.to_string(),
        })
    }
}

/// In-memory store: the degraded mode when no data directory is usable,
/// and the double used throughout the service tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|e| Error::StorageRead {
            key: key.to_string(),
            detail: e.to_string(),
        })?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|e| Error::StorageWrite {
            key: key.to_string(),
            detail: e.to_string(),
        })?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read and decode a record. Read or decode failure degrades to `None`
/// with a warning; callers fall through to the next source in the chain.
pub fn load_record<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "snapshot read failed");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            let e = Error::StorageDecode {
                key: key.to_string(),
                detail: e.to_string(),
            };
            tracing::warn!(key, error = %e, "snapshot decode failed");
            None
        }
    }
}

/// Persist a record, fire-and-forget. A failed write is logged and the
/// cycle continues on the in-memory copy.
pub fn save_record<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key, error = %e, "snapshot encode failed");
            return;
        }
    };

    if let Err(e) = store.put(key, &raw) {
        tracing::warn!(key, error = %e, "snapshot write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::PricePoint;
    use crate::types::timestamp::Timestamp;

    #[test]
    fn memory_store_round_trips_records() {
        let store = MemoryStore::new();
        let point = PricePoint {
            time: Timestamp::from_millis(1_000),
            price: 30.25,
            exchange_breakdown: None,
        };

        save_record(&store, HISTORY_KEY, &vec![point.clone()]);
        let loaded: Vec<PricePoint> = load_record(&store, HISTORY_KEY).unwrap();
        assert_eq!(loaded, vec![point]);
    }

    #[test]
    fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(load_record::<Vec<PricePoint>>(&store, GLOBAL_SNAPSHOT_KEY).is_none());
    }

    #[test]
    fn corrupt_record_degrades_to_none() {
        let store = MemoryStore::new();
        store.put(GLOBAL_SNAPSHOT_KEY, "{not json").unwrap();
        assert!(load_record::<PricePoint>(&store, GLOBAL_SNAPSHOT_KEY).is_none());
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!(
            "silverfeed-store-test-{}",
            std::process::id()
        ));
        let store = JsonFileStore::new(&dir).unwrap();

        store.put(REGIONAL_SNAPSHOT_KEY, "{\"x\":1}").unwrap();
        assert_eq!(
            store.get(REGIONAL_SNAPSHOT_KEY).unwrap().as_deref(),
            Some("{\"x\":1}")
        );
        assert!(store.get(GLOBAL_SNAPSHOT_KEY).unwrap().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
