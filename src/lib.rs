//! shelf-store - local persistence for a personal knowledge manager
//!
//! This crate stores uploaded files and synced application data with:
//! - redb embedded database (ACID, MVCC, crash-safe), one transaction per operation
//! - File payloads kept apart from file metadata so listings never load blobs
//! - A non-unique name index over files
//! - Explicit per-instance configuration of database name, version and tables
//! - REST API for the UI layer, with multipart upload and metadata export

pub mod api;
pub mod config;
pub mod object_store;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn object_store::ObjectStore>,
}
