//! Shared test helpers for handler tests.

use std::sync::Arc;

use crate::config::{Config, ServerConfig, StoreConfig};
use crate::object_store::RedbObjectStore;
use crate::AppState;

/// Create a test AppState backed by a fresh in-memory store.
pub fn test_state() -> Arc<AppState> {
    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
        },
        store: StoreConfig::in_memory(),
        test_mode: true,
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
    };

    let store = RedbObjectStore::new(config.store.clone());

    Arc::new(AppState {
        config,
        store: Arc::new(store),
    })
}
