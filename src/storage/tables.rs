use redb::{MultimapTableDefinition, TableDefinition};

use crate::config::SchemaConfig;

pub const META_TABLE: &str = "meta";

/// Internal bookkeeping: "schema_version" -> u64
pub const META: TableDefinition<&str, u64> = TableDefinition::new(META_TABLE);

pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Table definitions resolved from the configured table names.
impl SchemaConfig {
    /// File metadata: id -> FileMetadata (msgpack)
    pub fn files(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(&self.files_table)
    }

    /// File payloads: id -> raw bytes
    pub fn file_blobs(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(&self.file_blobs_table)
    }

    /// Non-unique name index: name -> {id}
    pub fn name_index(&self) -> MultimapTableDefinition<'_, &'static str, &'static str> {
        MultimapTableDefinition::new(&self.name_index)
    }

    /// Generic data: key -> DataRecord (msgpack)
    pub fn data(&self) -> TableDefinition<'_, &'static str, &'static [u8]> {
        TableDefinition::new(&self.data_table)
    }
}
