//! File handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use serde::Deserialize;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_entity::file::FileQuery;
use stowage_service::file::service::{
    PresignedUploadRequest, UpdateMetadataRequest, UploadRequest,
};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// Header carrying the client's original file name on direct uploads.
const FILE_NAME_HEADER: &str = "x-file-name";

/// GET /api/files
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<FileQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let listing = state.file_service.list_files(&auth, query).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": listing }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub folder_id: Option<Uuid>,
}

/// POST /api/files — raw body upload.
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    let original_name = headers
        .get(FILE_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::validation("x-file-name header is required"))?
        .to_string();

    let mime_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let file = state
        .file_service
        .upload(
            &auth,
            UploadRequest {
                folder_id: params.folder_id,
                original_name,
                mime_type,
                data: body,
            },
        )
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

/// POST /api/files/upload-url
pub async fn presign_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<PresignedUploadRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let upload = state.file_service.issue_presigned_upload(&auth, req).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": upload })))
}

#[derive(Debug, Deserialize)]
pub struct MoveFileRequest {
    /// Destination folder; null/omitted = root.
    pub destination_folder_id: Option<Uuid>,
}

/// PUT /api/files/{id}/move
pub async fn move_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<MoveFileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let file = state
        .file_service
        .move_file(&auth, id, req.destination_folder_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

#[derive(Debug, Deserialize)]
pub struct DownloadUrlParams {
    #[serde(default = "default_expiration")]
    pub expires_in: u64,
}

fn default_expiration() -> u64 {
    3_600
}

/// GET /api/files/{id}/download-url
pub async fn download_url(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<DownloadUrlParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let download = state
        .file_service
        .issue_presigned_download(id, auth.user_id, params.expires_in)
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": download }),
    ))
}

/// PATCH /api/files/{id}/metadata
pub async fn update_metadata(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMetadataRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let file = state.file_service.update_metadata(&auth, id, req).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": file })))
}

/// DELETE /api/files/{id} — soft delete.
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    state.file_service.delete_file(&auth, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/files/{id}/permanent
pub async fn permanent_delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let outcome = state.file_service.permanent_delete(&auth, id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": outcome }),
    ))
}
