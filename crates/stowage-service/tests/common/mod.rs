//! Shared test harness: real services over the in-memory backends.

use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use stowage_database::memory::{MemoryFileStore, MemoryFolderStore, MemoryShareStore};
use stowage_entity::file::FileRecord;
use stowage_service::file::service::UploadRequest;
use stowage_service::{
    FileService, FolderService, RequestContext, ShareAccessService, ShareService,
};
use stowage_storage::MemoryObjectStore;

pub const CONTAINER: &str = "stowage-test";
pub const BASE_URL: &str = "https://stowage.test";

/// All services wired over shared in-memory stores.
pub struct TestEnv {
    pub folders: Arc<MemoryFolderStore>,
    pub files: Arc<MemoryFileStore>,
    pub shares: Arc<MemoryShareStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub folder_service: FolderService,
    pub file_service: FileService,
    pub share_service: ShareService,
    pub share_access: ShareAccessService,
}

impl TestEnv {
    pub fn new() -> Self {
        let folders = Arc::new(MemoryFolderStore::new());
        let files = Arc::new(MemoryFileStore::new());
        let shares = Arc::new(MemoryShareStore::new());
        let objects = Arc::new(MemoryObjectStore::new());

        let folder_service =
            FolderService::new(folders.clone(), objects.clone(), CONTAINER);
        let file_service = FileService::new(
            files.clone(),
            folders.clone(),
            objects.clone(),
            CONTAINER,
        );
        let share_service = ShareService::new(
            shares.clone(),
            files.clone(),
            folders.clone(),
            BASE_URL,
        );
        let share_access = ShareAccessService::new(
            shares.clone(),
            files.clone(),
            folders.clone(),
            objects.clone(),
        );

        Self {
            folders,
            files,
            shares,
            objects,
            folder_service,
            file_service,
            share_service,
            share_access,
        }
    }

    /// Upload a small text file through the real service.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        folder_id: Option<Uuid>,
        name: &str,
        content: &'static [u8],
    ) -> FileRecord {
        self.file_service
            .upload(
                ctx,
                UploadRequest {
                    folder_id,
                    original_name: name.to_string(),
                    mime_type: "text/plain".to_string(),
                    data: Bytes::from_static(content),
                },
            )
            .await
            .expect("upload should succeed")
    }
}

/// A fresh principal.
pub fn ctx() -> RequestContext {
    RequestContext::new(Uuid::new_v4(), "owner@example.com")
}
