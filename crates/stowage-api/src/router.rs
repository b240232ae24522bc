//! Route definitions for the Stowage HTTP API.
//!
//! Owner-scoped routes are mounted under `/api`; anonymous share-token
//! routes live under `/s`. The router receives `AppState` and passes it
//! to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(folder_routes())
        .merge(file_routes())
        .merge(share_routes());

    let public_routes = Router::new()
        .route("/s/{token}", get(handlers::public::view_share))
        .route("/s/{token}/download", get(handlers::public::download_share));

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Folder hierarchy endpoints.
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/folders", get(handlers::folder::list_children))
        .route("/folders", post(handlers::folder::create_folder))
        .route("/folders/{id}", patch(handlers::folder::rename_folder))
        .route("/folders/{id}", delete(handlers::folder::delete_folder))
        .route("/folders/{id}/path", get(handlers::folder::get_path))
}

/// File record endpoints.
fn file_routes() -> Router<AppState> {
    Router::new()
        .route("/files", get(handlers::file::list_files))
        .route("/files", post(handlers::file::upload_file))
        .route("/files/upload-url", post(handlers::file::presign_upload))
        .route("/files/{id}/move", put(handlers::file::move_file))
        .route("/files/{id}/download-url", get(handlers::file::download_url))
        .route("/files/{id}/metadata", patch(handlers::file::update_metadata))
        .route("/files/{id}", delete(handlers::file::delete_file))
        .route(
            "/files/{id}/permanent",
            delete(handlers::file::permanent_delete),
        )
}

/// Owner-side share endpoints.
fn share_routes() -> Router<AppState> {
    Router::new()
        .route("/shares", post(handlers::share::create_share))
        .route("/shares", get(handlers::share::list_shares))
        .route("/shares/{id}", get(handlers::share::get_share))
        .route("/shares/{id}", patch(handlers::share::update_share))
        .route("/shares/{id}", delete(handlers::share::revoke_share))
}
