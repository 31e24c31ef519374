use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata half of a file record, stored in the files table.
///
/// The payload lives in the blob table under the same id and is written in
/// the same transaction, so `size` always matches the stored bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// A file as returned by a point lookup: everything the caller needs to
/// render or download it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// A generic keyed value. The store never interprets `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRecord {
    pub key: String,
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Backup snapshot. Carries file metadata only; payloads and the data table
/// are not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub files: Vec<FileMetadata>,
}
