use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

use super::{ObjectStore, StoreError};
use crate::config::{StoreConfig, StoreLocation};
use crate::storage::models::{DataRecord, FileMetadata, StoredFile};
use crate::storage::{Database, DatabaseError, PurgeStats};

/// redb-backed object store.
///
/// The handle is opened on first use and reused afterwards. A failed open is
/// not remembered, so the next call tries again; an IO-level failure on a
/// disk database drops the handle so the next call reopens the file.
pub struct RedbObjectStore {
    config: StoreConfig,
    handle: Mutex<Option<Database>>,
}

impl RedbObjectStore {
    /// Create a store without touching the database yet.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            handle: Mutex::new(None),
        }
    }

    /// Create a store and open its database immediately.
    pub async fn connect_with(config: StoreConfig) -> Result<Self, StoreError> {
        let store = Self::new(config);
        store.open().await?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Schema version recorded in the open database
    pub async fn schema_version(&self) -> Result<Option<u64>, StoreError> {
        self.read(|db| db.version()).await
    }

    async fn connect(&self) -> Result<Database, StoreError> {
        let mut slot = self.handle.lock().await;
        if let Some(db) = slot.as_ref() {
            return Ok(db.clone());
        }

        let db = Database::open(&self.config).map_err(|e| {
            tracing::warn!(store = %self.config.name, error = %e, "Failed to open store");
            StoreError::StorageUnavailable(e)
        })?;
        tracing::debug!(store = %self.config.name, version = self.config.version, "Opened store");
        *slot = Some(db.clone());
        Ok(db)
    }

    async fn discard_if_broken(&self, error: &DatabaseError) {
        let on_disk = matches!(self.config.location, StoreLocation::Disk(_));
        if on_disk && error.is_storage_failure() {
            tracing::warn!(store = %self.config.name, error = %error, "Discarding store handle");
            *self.handle.lock().await = None;
        }
    }

    async fn read<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnOnce(&Database) -> Result<T, DatabaseError> + Send,
    {
        let db = self.connect().await?;
        match op(&db) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.discard_if_broken(&e).await;
                Err(StoreError::ReadFailed(e))
            }
        }
    }

    async fn write<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send,
        F: FnOnce(&Database) -> Result<T, DatabaseError> + Send,
    {
        let db = self.connect().await?;
        match op(&db) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.discard_if_broken(&e).await;
                Err(StoreError::WriteFailed(e))
            }
        }
    }
}

#[async_trait]
impl ObjectStore for RedbObjectStore {
    async fn open(&self) -> Result<(), StoreError> {
        self.connect().await.map(|_| ())
    }

    async fn save_file(
        &self,
        id: &str,
        name: &str,
        mime_type: &str,
        data: Bytes,
    ) -> Result<FileMetadata, StoreError> {
        let record = self
            .write(|db| db.put_file(id, name, mime_type, &data))
            .await?;
        tracing::debug!(file_id = %id, size = record.size, "Saved file");
        Ok(record)
    }

    async fn get_file(&self, id: &str) -> Result<Option<StoredFile>, StoreError> {
        self.read(|db| db.get_file(id)).await
    }

    async fn delete_file(&self, id: &str) -> Result<(), StoreError> {
        let deleted = self.write(|db| db.delete_file(id)).await?;
        tracing::debug!(file_id = %id, deleted, "Deleted file");
        Ok(())
    }

    async fn get_all_files(&self) -> Result<Vec<FileMetadata>, StoreError> {
        self.read(|db| db.get_all_files()).await
    }

    async fn get_files_by_name(&self, name: &str) -> Result<Vec<FileMetadata>, StoreError> {
        self.read(|db| db.get_files_by_name(name)).await
    }

    async fn save_data(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<DataRecord, StoreError> {
        let record = self.write(|db| db.put_data(key, value)).await?;
        tracing::debug!(key = %key, "Saved data");
        Ok(record)
    }

    async fn get_data(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let record = self.read(|db| db.get_data(key)).await?;
        Ok(record.map(|r| r.data))
    }

    async fn get_data_record(&self, key: &str) -> Result<Option<DataRecord>, StoreError> {
        self.read(|db| db.get_data(key)).await
    }

    async fn delete_data(&self, key: &str) -> Result<(), StoreError> {
        let deleted = self.write(|db| db.delete_data(key)).await?;
        tracing::debug!(key = %key, deleted, "Deleted data");
        Ok(())
    }

    async fn purge(&self) -> Result<PurgeStats, StoreError> {
        let stats = self.write(|db| db.purge_all()).await?;
        tracing::warn!(files = stats.files, data = stats.data, "Purged store");
        Ok(stats)
    }
}
