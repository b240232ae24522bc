//! Anonymous share-token handlers.
//!
//! No identity headers here: the token is the authorization. Recipients
//! on restricted shares identify themselves with an `email` query
//! parameter.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use stowage_service::share::access::ShareDownloadRequest;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ShareViewParams {
    pub email: Option<String>,
}

/// GET /s/{token}
pub async fn view_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(params): Query<ShareViewParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let resolved = state
        .share_access
        .view_via_token(&token, params.email.as_deref())
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": resolved }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ShareDownloadParams {
    pub email: Option<String>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_expiration")]
    pub expires_in: u64,
}

fn default_expiration() -> u64 {
    3_600
}

/// GET /s/{token}/download
pub async fn download_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(params): Query<ShareDownloadParams>,
) -> ApiResult<Json<serde_json::Value>> {
    let download = state
        .share_access
        .download_via_token(
            &token,
            params.email.as_deref(),
            ShareDownloadRequest {
                recursive: params.recursive,
                expiration_seconds: params.expires_in,
            },
        )
        .await?;
    Ok(Json(
        serde_json::json!({ "success": true, "data": download }),
    ))
}
