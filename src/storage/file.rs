use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::errors::StorageError;
use super::store::KeyValueStore;

/// Store kept as a single JSON object on disk.
///
/// The whole object is rewritten on every change through a temporary file
/// and a rename, so a crash never leaves a half-written document behind.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store, starting empty when the file does not exist yet
    #[instrument]
    pub async fn open(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                warn!(error = %e, path = %path.display(), "Data file is not a JSON object");
                StorageError::Serialization(e)
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Data file not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = entries.len(), "File store opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");

        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            warn!(error = %e, path = %self.path.display(), "Failed to replace data file");
            StorageError::Io(e)
        })?;

        debug!(path = %self.path.display(), keys = entries.len(), "Data file written");
        Ok(())
    }

    /// Applies `change` to a copy and only keeps it once it is on disk
    async fn update<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) + Send,
    {
        let mut entries = self.entries.lock().await;
        let mut candidate = entries.clone();
        change(&mut candidate);

        self.flush(&candidate).await?;
        *entries = candidate;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
        .await
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if !self.entries.lock().await.contains_key(key) {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(key);
        })
        .await
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.lock().await.keys().cloned().collect())
    }

    #[instrument(skip(self, records))]
    async fn replace_namespace(
        &self,
        prefix: &str,
        records: &BTreeMap<String, String>,
    ) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.retain(|k, _| !k.starts_with(prefix));
            entries.extend(records.iter().map(|(k, v)| (k.clone(), v.clone())));
        })
        .await
    }
}
