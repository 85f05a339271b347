use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::store::KeyValueStore;
use crate::clock::Clock;
use crate::errors::CoreError;
use crate::models::settings::CacheConfig;

/// Cache key of the full registry fund list.
pub const ALL_FUNDS_KEY: &str = "all_funds";

/// Cache key of one scheme's NAV history.
pub fn history_key(scheme_code: &str) -> String {
    format!("history_{scheme_code}")
}

/// A cached payload together with the instant it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub payload: T,
    pub written_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Fresh while `now - written_at` does not exceed `max_age`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.written_at <= max_age
    }
}

/// On-storage shape of an entry. The payload is kept as serialized JSON
/// text so that sizes can be measured without decoding it.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    data: String,
    timestamp: DateTime<Utc>,
}

/// Just the timestamp of a stored entry; the payload is skipped.
#[derive(Deserialize)]
struct StoredStamp {
    timestamp: DateTime<Utc>,
}

/// Time-bounded cache of registry payloads.
///
/// Entries are replaced whole on every write and never merged. The cache is
/// only an optimization: a missing, stale, corrupt or unreadable entry is a
/// miss, and storage failures are logged rather than returned.
pub struct FundRegistryCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    namespace: String,
    default_max_age: Duration,
}

impl FundRegistryCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: &CacheConfig) -> Self {
        Self {
            store,
            clock,
            namespace: config.namespace.clone(),
            default_max_age: config.default_max_age(),
        }
    }

    pub fn default_max_age(&self) -> Duration {
        self.default_max_age
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Serialize `payload` and store it under `key`, stamped with the current time.
    pub fn put<T: Serialize>(&self, key: &str, payload: &T) -> Result<(), CoreError> {
        let data = serde_json::to_string(payload)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize cache payload: {e}")))?;
        let entry = StoredEntry {
            data,
            timestamp: self.clock.now(),
        };
        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize cache entry: {e}")))?;
        self.store.put(&self.storage_key(key), bytes)?;
        debug!("Cached '{key}' ({} bytes)", entry.data.len());
        Ok(())
    }

    /// The payload under `key` if present, decodable and no older than
    /// `max_age` (the default window when `None`).
    pub fn get<T: DeserializeOwned>(&self, key: &str, max_age: Option<Duration>) -> Option<T> {
        let max_age = max_age.unwrap_or(self.default_max_age);
        let entry = self.entry::<T>(key)?;
        if entry.is_fresh(self.clock.now(), max_age) {
            Some(entry.payload)
        } else {
            debug!("Cache entry '{key}' is stale");
            None
        }
    }

    /// The entry under `key` regardless of age. Undecodable entries are purged.
    pub fn entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let bytes = self.read_raw(key)?;
        let decoded = serde_json::from_slice::<StoredEntry>(&bytes).and_then(|stored| {
            let payload = serde_json::from_str::<T>(&stored.data)?;
            Ok(CacheEntry {
                payload,
                written_at: stored.timestamp,
            })
        });
        match decoded {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Discarding corrupt cache entry '{key}': {e}");
                self.invalidate(key);
                None
            }
        }
    }

    /// Freshness check that does not decode the payload.
    pub fn is_fresh(&self, key: &str, max_age: Option<Duration>) -> bool {
        let max_age = max_age.unwrap_or(self.default_max_age);
        let Some(bytes) = self.read_raw(key) else {
            return false;
        };
        match serde_json::from_slice::<StoredStamp>(&bytes) {
            Ok(stamp) => self.clock.now() - stamp.timestamp <= max_age,
            Err(_) => false,
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Err(e) = self.store.remove(&self.storage_key(key)) {
            warn!("Failed to invalidate cache entry '{key}': {e}");
        }
    }

    /// Remove every entry in this cache's namespace.
    pub fn invalidate_all(&self) {
        self.invalidate_matching("");
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn invalidate_matching(&self, prefix: &str) {
        for key in self.keys() {
            if key.starts_with(prefix) {
                self.invalidate(&key);
            }
        }
    }

    /// Keys (without namespace) of every entry in this cache.
    pub fn keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|k| k.strip_prefix(&self.namespace).map(str::to_string))
                .collect(),
            Err(e) => {
                warn!("Failed to list cache keys: {e}");
                Vec::new()
            }
        }
    }

    /// Total serialized payload size across this cache's entries.
    pub fn size_bytes(&self) -> usize {
        self.keys()
            .iter()
            .filter_map(|key| self.read_raw(key))
            .filter_map(|bytes| serde_json::from_slice::<StoredEntry>(&bytes).ok())
            .map(|entry| entry.data.len())
            .sum()
    }

    fn read_raw(&self, key: &str) -> Option<Vec<u8>> {
        match self.store.get(&self.storage_key(key)) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cache read failed for '{key}': {e}");
                None
            }
        }
    }
}
