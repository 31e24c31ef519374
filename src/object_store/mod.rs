mod redb_store;

pub use redb_store::RedbObjectStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::storage::models::{DataRecord, ExportSnapshot, FileMetadata, StoredFile};
use crate::storage::{DatabaseError, PurgeStats};

/// Failure of a single store operation. A missing id or key is not an error;
/// lookups report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] DatabaseError),
    #[error("Read failed: {0}")]
    ReadFailed(#[source] DatabaseError),
    #[error("Write failed: {0}")]
    WriteFailed(#[source] DatabaseError),
}

/// Durable local storage for file blobs and keyed application data.
///
/// Every call is its own transaction. Nothing is retried; the caller decides
/// what to do with a failure.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Connect, creating or upgrading the database if needed. Idempotent.
    async fn open(&self) -> Result<(), StoreError>;

    async fn save_file(
        &self,
        id: &str,
        name: &str,
        mime_type: &str,
        data: Bytes,
    ) -> Result<FileMetadata, StoreError>;
    async fn get_file(&self, id: &str) -> Result<Option<StoredFile>, StoreError>;
    async fn delete_file(&self, id: &str) -> Result<(), StoreError>;
    async fn get_all_files(&self) -> Result<Vec<FileMetadata>, StoreError>;
    async fn get_files_by_name(&self, name: &str) -> Result<Vec<FileMetadata>, StoreError>;

    async fn save_data(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<DataRecord, StoreError>;
    async fn get_data(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;
    async fn get_data_record(&self, key: &str) -> Result<Option<DataRecord>, StoreError>;
    async fn delete_data(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every file and data record. Test mode only.
    async fn purge(&self) -> Result<PurgeStats, StoreError>;

    /// Snapshot for backup: the file metadata listing, nothing else.
    async fn export_all_data(&self) -> Result<ExportSnapshot, StoreError> {
        let files = self.get_all_files().await?;
        Ok(ExportSnapshot { files })
    }
}
