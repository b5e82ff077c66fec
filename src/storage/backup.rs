use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

use super::errors::StorageError;
use super::persistence::{decode, Decoding, Persistence, HISTORY_KEY, NAMESPACE, PLAYERS_KEY};
use crate::app::AppData;

/// Namespaced key -> stored JSON text, as written to a backup file
pub type BackupDocument = BTreeMap<String, String>;

/// Result of a successful import
#[derive(Debug)]
pub struct ImportSummary {
    pub restored: usize,
    pub data: AppData,
}

impl Persistence {
    /// Every namespaced record as stored
    #[instrument(skip(self))]
    pub async fn export(&self) -> Result<BackupDocument, StorageError> {
        let mut document = BackupDocument::new();
        for key in self.store().keys().await? {
            if !key.starts_with(NAMESPACE) {
                continue;
            }
            if let Some(value) = self.store().get(&key).await? {
                document.insert(key, value);
            }
        }

        info!(records = document.len(), "Backup exported");
        Ok(document)
    }

    /// Replaces all namespaced records with the backup's.
    ///
    /// Every record is parsed before anything is written, so a bad document
    /// leaves the store untouched.
    #[instrument(skip(self, document))]
    pub async fn import(&self, document: &Value) -> Result<ImportSummary, StorageError> {
        let object = document.as_object().ok_or_else(|| {
            warn!("Backup is not a JSON object");
            StorageError::InvalidFormat("backup must be a JSON object".to_string())
        })?;

        let has_core_record = [PLAYERS_KEY, HISTORY_KEY]
            .iter()
            .any(|key| object.get(*key).is_some_and(is_present));
        if !has_core_record {
            warn!("Backup has neither players nor history");
            return Err(StorageError::InvalidFormat(
                "backup contains no players or history".to_string(),
            ));
        }

        let records: BTreeMap<String, String> = object
            .iter()
            .filter(|(key, _)| key.starts_with(NAMESPACE))
            .map(|(key, value)| {
                let text = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect();

        let data = decode(&records, Decoding::Strict)?;
        self.store().replace_namespace(NAMESPACE, &records).await?;

        info!(records = records.len(), "Backup imported");
        Ok(ImportSummary {
            restored: records.len(),
            data,
        })
    }

    /// Removes every namespaced record
    #[instrument(skip(self))]
    pub async fn factory_reset(&self) -> Result<(), StorageError> {
        self.store()
            .replace_namespace(NAMESPACE, &BTreeMap::new())
            .await?;
        info!("All application data erased");
        Ok(())
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}
