use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, JSend};
use crate::storage::models::ExportSnapshot;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub data_deleted: u64,
    pub files_deleted: u64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Reports "ok" only when the store can be opened.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<HealthResponse>>, ApiError> {
    state.store.open().await?;

    Ok(JSend::success(HealthResponse {
        status: "ok".to_string(),
        store: state.config.store.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Backup snapshot: `{"files": [...]}` with metadata only.
pub async fn export(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExportSnapshot>, ApiError> {
    let snapshot = state.store.export_all_data().await?;
    Ok(Json(snapshot))
}

pub async fn admin_purge(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<PurgeResponse>>, ApiError> {
    let stats = state.store.purge().await?;

    Ok(JSend::success(PurgeResponse {
        data_deleted: stats.data,
        files_deleted: stats.files,
    }))
}
