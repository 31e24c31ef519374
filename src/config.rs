use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::META_TABLE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    /// Enables dangerous operations like purge. Must never be true in production.
    pub test_mode: bool,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
}

/// Where the embedded database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Database file `<dir>/<name>.redb`
    Disk(PathBuf),
    /// Volatile redb backend, one independent database per store instance
    InMemory,
}

/// Identity and layout of one store instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub name: String,
    /// Schema version. Opening an older database upgrades it; opening a newer one fails.
    pub version: u64,
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaConfig {
    pub files_table: String,
    pub file_blobs_table: String,
    pub name_index: String,
    pub data_table: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            files_table: "files".to_string(),
            file_blobs_table: "file_blobs".to_string(),
            name_index: "files_by_name".to_string(),
            data_table: "data".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            location: StoreLocation::Disk(PathBuf::from("./data")),
            name: "shelf".to_string(),
            version: 1,
            schema: SchemaConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
            ..Default::default()
        }
    }

    pub fn on_disk<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            location: StoreLocation::Disk(dir.into()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "STORE_NAME cannot be empty".to_string(),
            ));
        }

        if self.version == 0 {
            return Err(ConfigError::ValidationError(
                "STORE_VERSION must be at least 1".to_string(),
            ));
        }

        let names = [
            &self.schema.files_table,
            &self.schema.file_blobs_table,
            &self.schema.name_index,
            &self.schema.data_table,
        ];
        let mut seen = HashSet::new();
        for name in names {
            if name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "table names cannot be empty".to_string(),
                ));
            }
            if name == META_TABLE {
                return Err(ConfigError::ValidationError(format!(
                    "table name '{name}' is reserved"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "table name '{name}' is used more than once"
                )));
            }
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let location = match std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "disk".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StoreLocation::InMemory,
            _ => StoreLocation::Disk(PathBuf::from(data_dir)),
        };

        let name = std::env::var("STORE_NAME").unwrap_or_else(|_| "shelf".to_string());

        let version = match std::env::var("STORE_VERSION") {
            Ok(v) => v.parse().map_err(|_| {
                ConfigError::ValidationError(format!("STORE_VERSION '{v}' is not a number"))
            })?,
            Err(_) => 1,
        };

        let test_mode = std::env::var("TEST_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let config = Config {
            server: ServerConfig { bind_address },
            store: StoreConfig {
                location,
                name,
                version,
                schema: SchemaConfig::default(),
            },
            test_mode,
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.store.location == StoreLocation::InMemory {
            tracing::warn!("In-memory store selected. Data will not survive a restart.");
        }

        self.store.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_store_config_is_valid() {
        assert!(StoreConfig::default().validate().is_ok());
        assert!(StoreConfig::in_memory().validate().is_ok());
    }

    #[test]
    fn rejects_version_zero() {
        let config = StoreConfig {
            version: 0,
            ..StoreConfig::in_memory()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_table_names() {
        let mut config = StoreConfig::in_memory();
        config.schema.data_table = "files".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_reserved_table_name() {
        let mut config = StoreConfig::in_memory();
        config.schema.name_index = "meta".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn rejects_empty_name() {
        let config = StoreConfig {
            name: "  ".to_string(),
            ..StoreConfig::in_memory()
        };
        assert!(config.validate().is_err());
    }
}
