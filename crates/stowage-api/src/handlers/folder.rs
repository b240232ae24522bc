//! Folder handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use stowage_service::folder::service::CreateFolderRequest;

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListChildrenParams {
    /// Parent to list under; omitted = root.
    pub parent_id: Option<Uuid>,
}

/// GET /api/folders
pub async fn list_children(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListChildrenParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let folders = state
        .folder_service
        .list_children(&auth, params.parent_id)
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": folders }),
    ))
}

/// GET /api/folders/{id}/path
pub async fn get_path(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let segments = state
        .folder_service
        .path_segments(auth.user_id, Some(id))
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": segments }),
    ))
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateFolderRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let folder = state.folder_service.create_folder(&auth, req).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": folder })))
}

#[derive(Debug, Deserialize)]
pub struct RenameFolderRequest {
    pub name: String,
}

/// PATCH /api/folders/{id}
pub async fn rename_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameFolderRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let folder = state
        .folder_service
        .rename_folder(&auth, id, &req.name)
        .await?;
    Ok(Json(serde_json::json!({ "success": true, "data": folder })))
}

/// DELETE /api/folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let outcome = state.folder_service.soft_delete_subtree(&auth, id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": outcome }),
    ))
}
