use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::storage::models::DataRecord;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DataResponse {
    pub data: serde_json::Value,
    pub key: String,
    pub updated_at: String,
}

pub async fn put_data(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    AppJson(value): AppJson<serde_json::Value>,
) -> Result<Json<JSend<DataResponse>>, ApiError> {
    if key.trim().is_empty() {
        return Err(ApiError::bad_request("key must not be empty"));
    }

    let record = state.store.save_data(&key, value).await?;
    Ok(JSend::success(data_to_response(record)))
}

pub async fn get_data(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<JSend<DataResponse>>, ApiError> {
    let record = state
        .store
        .get_data_record(&key)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No value stored for '{key}'")))?;

    Ok(JSend::success(data_to_response(record)))
}

pub async fn delete_data(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    state.store.delete_data(&key).await?;
    Ok(JSend::success(()))
}

fn data_to_response(record: DataRecord) -> DataResponse {
    DataResponse {
        data: record.data,
        key: record.key,
        updated_at: record.updated_at.to_rfc3339(),
    }
}
