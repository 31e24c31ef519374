use redb::{
    backends::InMemoryBackend, Builder, Database as RedbDatabase, ReadTransaction,
    ReadableTable, ReadableTableMetadata, WriteTransaction,
};
use std::sync::Arc;
use thiserror::Error;

use super::tables::*;
use crate::config::{SchemaConfig, StoreConfig, StoreLocation};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Commit error: {0}")]
    Commit(Box<redb::CommitError>),
    #[error("Database error: {0}")]
    Redb(Box<redb::Error>),
    #[error("Database error: {0}")]
    RedbDatabase(Box<redb::DatabaseError>),
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Payload missing for file {0}")]
    MissingPayload(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),
    #[error("Storage error: {0}")]
    Storage(Box<redb::StorageError>),
    #[error("Table error: {0}")]
    Table(Box<redb::TableError>),
    #[error("Transaction error: {0}")]
    Transaction(Box<redb::TransactionError>),
    #[error("Database is at schema version {stored}, cannot open as version {requested}")]
    VersionConflict { stored: u64, requested: u64 },
}

impl DatabaseError {
    /// True when the engine reported an IO-level failure, whichever redb error
    /// type carried it. After one of these the handle may be unusable.
    pub fn is_storage_failure(&self) -> bool {
        match self {
            DatabaseError::Storage(_) | DatabaseError::Io(_) => true,
            DatabaseError::Commit(e) => matches!(**e, redb::CommitError::Storage(_)),
            DatabaseError::Redb(e) => matches!(**e, redb::Error::Io(_)),
            DatabaseError::RedbDatabase(e) => matches!(**e, redb::DatabaseError::Storage(_)),
            DatabaseError::Table(e) => matches!(**e, redb::TableError::Storage(_)),
            DatabaseError::Transaction(e) => matches!(**e, redb::TransactionError::Storage(_)),
            _ => false,
        }
    }
}

impl From<redb::CommitError> for DatabaseError {
    fn from(e: redb::CommitError) -> Self {
        DatabaseError::Commit(Box::new(e))
    }
}

impl From<redb::DatabaseError> for DatabaseError {
    fn from(e: redb::DatabaseError) -> Self {
        DatabaseError::RedbDatabase(Box::new(e))
    }
}

impl From<redb::Error> for DatabaseError {
    fn from(e: redb::Error) -> Self {
        DatabaseError::Redb(Box::new(e))
    }
}

impl From<redb::StorageError> for DatabaseError {
    fn from(e: redb::StorageError) -> Self {
        DatabaseError::Storage(Box::new(e))
    }
}

impl From<redb::TableError> for DatabaseError {
    fn from(e: redb::TableError) -> Self {
        DatabaseError::Table(Box::new(e))
    }
}

impl From<redb::TransactionError> for DatabaseError {
    fn from(e: redb::TransactionError) -> Self {
        DatabaseError::Transaction(Box::new(e))
    }
}

/// A live handle on one store database. Cloning shares the handle.
pub struct Database {
    db: Arc<RedbDatabase>,
    schema: Arc<SchemaConfig>,
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            schema: Arc::clone(&self.schema),
        }
    }
}

/// Statistics from a purge operation
#[derive(Debug, Default)]
pub struct PurgeStats {
    pub files: u64,
    pub data: u64,
}

impl Database {
    /// Open or create the database described by `config`, creating or
    /// upgrading its tables to `config.version`.
    pub fn open(config: &StoreConfig) -> Result<Self, DatabaseError> {
        let db = match &config.location {
            StoreLocation::Disk(dir) => {
                std::fs::create_dir_all(dir)?;
                RedbDatabase::create(dir.join(format!("{}.redb", config.name)))?
            }
            StoreLocation::InMemory => Builder::new().create_with_backend(InMemoryBackend::new())?,
        };

        let database = Self {
            db: Arc::new(db),
            schema: Arc::new(config.schema.clone()),
        };
        database.upgrade(config.version)?;
        Ok(database)
    }

    /// Create the tables and record the version when the database is new or
    /// older than `version`. A newer database is left untouched and rejected.
    fn upgrade(&self, version: u64) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut meta = write_txn.open_table(META)?;
            let stored = meta.get(SCHEMA_VERSION_KEY)?.map(|v| v.value());

            match stored {
                Some(stored) if stored > version => {
                    return Err(DatabaseError::VersionConflict {
                        stored,
                        requested: version,
                    });
                }
                Some(stored) if stored == version => {}
                _ => {
                    let _ = write_txn.open_table(self.schema.files())?;
                    let _ = write_txn.open_table(self.schema.file_blobs())?;
                    let _ = write_txn.open_multimap_table(self.schema.name_index())?;
                    let _ = write_txn.open_table(self.schema.data())?;
                    meta.insert(SCHEMA_VERSION_KEY, version)?;
                    tracing::info!(from = ?stored, to = version, "Initialized store schema");
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    /// Schema version recorded in the database
    pub fn version(&self) -> Result<Option<u64>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let meta = read_txn.open_table(META)?;
        let version = meta.get(SCHEMA_VERSION_KEY)?.map(|v| v.value());
        Ok(version)
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction, DatabaseError> {
        Ok(self.db.begin_read()?)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction, DatabaseError> {
        Ok(self.db.begin_write()?)
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    /// Purge all data - for testing only
    pub fn purge_all(&self) -> Result<PurgeStats, DatabaseError> {
        let write_txn = self.begin_write()?;
        let mut stats = PurgeStats::default();

        {
            let mut files = write_txn.open_table(self.schema.files())?;
            stats.files = files.len()?;
            files.retain(|_, _| false)?;

            let mut blobs = write_txn.open_table(self.schema.file_blobs())?;
            blobs.retain(|_, _| false)?;

            let mut data = write_txn.open_table(self.schema.data())?;
            stats.data = data.len()?;
            data.retain(|_, _| false)?;
        }
        // Multimap tables have no retain; recreate the index instead.
        write_txn.delete_multimap_table(self.schema.name_index())?;
        let _ = write_txn.open_multimap_table(self.schema.name_index())?;

        write_txn.commit()?;
        Ok(stats)
    }
}
