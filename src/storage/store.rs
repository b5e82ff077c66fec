use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::errors::StorageError;

/// String key-value storage, the server-side counterpart of browser local storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Deletes every key starting with `prefix`, then writes `records`.
    ///
    /// Implementations apply this as a single step where the backend allows it.
    async fn replace_namespace(
        &self,
        prefix: &str,
        records: &BTreeMap<String, String>,
    ) -> Result<(), StorageError>;
}

/// In-memory store for development and testing.
///
/// An optional byte quota (keys plus values) makes writes fail the way a
/// full browser storage would.
pub struct InMemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    quota: Mutex<Option<usize>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota: Mutex::new(None),
        }
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            quota: Mutex::new(Some(quota)),
        }
    }

    /// Changes the byte limit for subsequent writes
    pub fn set_quota(&self, quota: Option<usize>) {
        *self.quota.lock().unwrap() = quota;
    }

    /// Bytes currently used by keys and values
    pub fn used_bytes(&self) -> usize {
        usage(&self.entries.lock().unwrap())
    }

    fn check_quota(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        match *self.quota.lock().unwrap() {
            Some(quota) if usage(entries) > quota => {
                warn!(quota, used = usage(entries), "In-memory store quota exceeded");
                Err(StorageError::QuotaExceeded)
            }
            _ => Ok(()),
        }
    }
}

fn usage(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap();
        let value = entries.get(key).cloned();
        debug!(key = %key, found = value.is_some(), "Read key from memory");
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap();

        let mut candidate = entries.clone();
        candidate.insert(key.to_string(), value.to_string());
        self.check_quota(&candidate)?;

        *entries = candidate;
        debug!(key = %key, bytes = value.len(), "Wrote key to memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
        debug!(key = %key, "Removed key from memory");
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.keys().cloned().collect())
    }

    #[instrument(skip(self, records))]
    async fn replace_namespace(
        &self,
        prefix: &str,
        records: &BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap();

        let mut candidate: BTreeMap<String, String> = entries
            .iter()
            .filter(|(k, _)| !k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        candidate.extend(records.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.check_quota(&candidate)?;

        *entries = candidate;
        debug!(prefix = %prefix, records = records.len(), "Replaced namespace in memory");
        Ok(())
    }
}
