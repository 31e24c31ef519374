use bytes::Bytes;
use chrono::Utc;
use redb::{ReadableMultimapTable, ReadableTable};

use super::db::{Database, DatabaseError};
use super::models::{FileMetadata, StoredFile};

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Store a file, replacing any record with the same id. Metadata, payload
    /// and name index change together in one write transaction.
    pub fn put_file(
        &self,
        id: &str,
        name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<FileMetadata, DatabaseError> {
        let record = FileMetadata {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size: data.len() as u64,
            created_at: Utc::now(),
        };

        let write_txn = self.begin_write()?;
        {
            let mut files = write_txn.open_table(self.schema().files())?;
            let previous: Option<FileMetadata> = files
                .get(id)?
                .map(|v| rmp_serde::from_slice(v.value()))
                .transpose()?;

            let encoded = rmp_serde::to_vec_named(&record)?;
            files.insert(id, encoded.as_slice())?;

            let mut blobs = write_txn.open_table(self.schema().file_blobs())?;
            blobs.insert(id, data)?;

            let mut name_index = write_txn.open_multimap_table(self.schema().name_index())?;
            if let Some(previous) = previous {
                if previous.name != record.name {
                    name_index.remove(previous.name.as_str(), id)?;
                }
            }
            name_index.insert(record.name.as_str(), id)?;
        }
        write_txn.commit()?;
        Ok(record)
    }

    /// Get a file's name, type and payload by id
    pub fn get_file(&self, id: &str) -> Result<Option<StoredFile>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let files = read_txn.open_table(self.schema().files())?;

        let metadata: FileMetadata = match files.get(id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(None),
        };

        let blobs = read_txn.open_table(self.schema().file_blobs())?;
        let data = match blobs.get(id)? {
            Some(data) => Bytes::copy_from_slice(data.value()),
            None => return Err(DatabaseError::MissingPayload(id.to_string())),
        };

        Ok(Some(StoredFile {
            name: metadata.name,
            mime_type: metadata.mime_type,
            data,
        }))
    }

    /// Get a file's metadata without touching its payload
    pub fn get_file_metadata(&self, id: &str) -> Result<Option<FileMetadata>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let files = read_txn.open_table(self.schema().files())?;

        match files.get(id)? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// Delete a file and its index entry. Returns whether anything was removed.
    pub fn delete_file(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;

        let deleted = {
            let mut files = write_txn.open_table(self.schema().files())?;
            let removed: Option<FileMetadata> = files
                .remove(id)?
                .map(|v| rmp_serde::from_slice(v.value()))
                .transpose()?;

            let mut blobs = write_txn.open_table(self.schema().file_blobs())?;
            blobs.remove(id)?;

            match removed {
                Some(file) => {
                    let mut name_index =
                        write_txn.open_multimap_table(self.schema().name_index())?;
                    name_index.remove(file.name.as_str(), id)?;
                    true
                }
                None => false,
            }
        };

        write_txn.commit()?;
        Ok(deleted)
    }

    /// Metadata for every file, in key order. Payloads are never read.
    pub fn get_all_files(&self) -> Result<Vec<FileMetadata>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let files = read_txn.open_table(self.schema().files())?;

        let mut result = Vec::new();
        for entry in files.iter()? {
            let (_, value) = entry?;
            result.push(rmp_serde::from_slice(value.value())?);
        }

        Ok(result)
    }

    /// Metadata for every file with the given display name, via the name index
    pub fn get_files_by_name(&self, name: &str) -> Result<Vec<FileMetadata>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let name_index = read_txn.open_multimap_table(self.schema().name_index())?;
        let files = read_txn.open_table(self.schema().files())?;

        let mut result = Vec::new();
        for id in name_index.get(name)? {
            let id = id?;
            if let Some(data) = files.get(id.value())? {
                result.push(rmp_serde::from_slice(data.value())?);
            }
        }

        Ok(result)
    }
}
