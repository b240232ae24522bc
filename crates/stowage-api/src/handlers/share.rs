//! Owner-side share handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use stowage_core::types::ListRange;
use stowage_service::share::service::{CreateShareRequest, UpdateShareRequest};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// POST /api/shares
pub async fn create_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateShareRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let created = state.share_service.create_share(&auth, req).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": created }),
    ))
}

/// GET /api/shares
pub async fn list_shares(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<ListRange>,
) -> ApiResult<Json<serde_json::Value>> {
    let page = state.share_service.list_shares(&auth, range).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": page })))
}

/// GET /api/shares/{id}
pub async fn get_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let share = state.share_service.get_share(&auth, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": share })))
}

/// PATCH /api/shares/{id}
pub async fn update_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateShareRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let share = state.share_service.update_share(&auth, id, req).await?;
    Ok(Json(serde_json::json!({ "success": true, "data": share })))
}

/// DELETE /api/shares/{id}
pub async fn revoke_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let revoked = state.share_service.revoke_share(&auth, id).await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": { "revoked": revoked } }),
    ))
}
