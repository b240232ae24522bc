//! Application state shared across all handlers.

use std::sync::Arc;

use stowage_service::{FileService, FolderService, ShareAccessService, ShareService};

/// Application state containing all shared services.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Folder hierarchy service.
    pub folder_service: Arc<FolderService>,
    /// File record service.
    pub file_service: Arc<FileService>,
    /// Share lifecycle service.
    pub share_service: Arc<ShareService>,
    /// Anonymous share access service.
    pub share_access: Arc<ShareAccessService>,
}
