use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery, JSend, JSendPaginated, Pagination};
use crate::storage::models::FileMetadata;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub name: Option<String>,
}

fn default_limit() -> u32 {
    20
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<FileMetadata>>, ApiError> {
    let mut file_data: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut file_content_type: Option<String> = None;
    let mut id: Option<String> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                file_content_type = field.content_type().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                if data.len() as u64 > state.config.max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File exceeds maximum upload size of {} bytes",
                        state.config.max_upload_size
                    )));
                }
                file_data = Some(data);
            }
            "id" => {
                id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid id: {e}")))?,
                );
            }
            "name" => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("Invalid name: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let file_data = file_data.ok_or_else(|| ApiError::bad_request("file field is required"))?;

    let id = match id {
        Some(id) if id.trim().is_empty() => {
            return Err(ApiError::bad_request("id must not be empty"));
        }
        Some(id) => id,
        None => uuid::Uuid::new_v4().to_string(),
    };

    let name = name
        .or_else(|| file_name.clone())
        .unwrap_or_else(|| id.clone());

    let mime_type = resolve_mime_type(file_content_type, file_name.as_deref());

    let record = state
        .store
        .save_file(&id, &name, &mime_type, file_data)
        .await?;

    Ok(JSend::success(record))
}

/// Serve a file's payload with its stored content type.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let file = state
        .store
        .get_file(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let size = file.data.len() as u64;
    let mut response = (StatusCode::OK, file.data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        file.mime_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(size));

    if let Ok(value) = format!("inline; filename=\"{}\"", file.name.replace('"', "")).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<()>>, ApiError> {
    state.store.delete_file(&id).await?;
    Ok(JSend::success(()))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<JSendPaginated<FileMetadata>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let files = match params.name.as_deref() {
        Some(name) => state.store.get_files_by_name(name).await?,
        None => state.store.get_all_files().await?,
    };

    let total = files.len() as u64;
    let items: Vec<FileMetadata> = files
        .into_iter()
        .skip(params.offset as usize)
        .take(params.limit as usize)
        .collect();

    Ok(JSendPaginated::success(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
            total,
        },
    ))
}

// ============================================================================
// Helpers
// ============================================================================

/// Content type from the multipart part, else guessed from the filename.
fn resolve_mime_type(content_type: Option<String>, file_name: Option<&str>) -> String {
    content_type
        .filter(|ct| ct != "application/octet-stream")
        .or_else(|| {
            file_name
                .and_then(|n| mime_guess::from_path(n).first())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}
