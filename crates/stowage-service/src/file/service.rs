//! Per-file metadata, moves, and access-checked presigned URL issuance.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::object_store::ObjectStore;
use stowage_database::repositories::{FileStore, FolderStore};
use stowage_entity::file::{CreateFileRecord, FileListing, FileQuery, FileRecord};
use stowage_entity::share::SharePermission;
use stowage_storage::keys;

use crate::context::RequestContext;

/// Lower bound on presigned URL lifetimes, in seconds.
pub(crate) const PRESIGN_MIN_SECS: u64 = 300;
/// Upper bound on presigned URL lifetimes, in seconds.
pub(crate) const PRESIGN_MAX_SECS: u64 = 86_400;
/// Listing limit bounds.
const LIST_LIMIT_MIN: u64 = 1;
const LIST_LIMIT_MAX: u64 = 100;

/// Clamp a requested presign lifetime into the allowed window.
pub(crate) fn clamp_expiration(seconds: u64) -> u64 {
    seconds.clamp(PRESIGN_MIN_SECS, PRESIGN_MAX_SECS)
}

/// Manages file records and their objects.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File store.
    files: Arc<dyn FileStore>,
    /// Folder store, for destination checks.
    folders: Arc<dyn FolderStore>,
    /// Object store gateway.
    objects: Arc<dyn ObjectStore>,
    /// Container for uploaded objects.
    container: String,
}

/// Request to upload a file directly through the service.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Destination folder (None = root).
    pub folder_id: Option<Uuid>,
    /// Name the file was uploaded with.
    pub original_name: String,
    /// MIME content type.
    pub mime_type: String,
    /// File content.
    pub data: Bytes,
}

/// Request for a presigned upload URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUploadRequest {
    /// Name the client intends to upload.
    pub original_name: String,
    /// MIME content type the client will send.
    pub mime_type: String,
    /// Requested URL lifetime in seconds (clamped).
    pub expiration_seconds: u64,
}

/// A presigned upload slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUpload {
    /// URL to PUT the content to.
    pub url: String,
    /// Object key the content will land at.
    pub object_key: String,
    /// Generated storage file name.
    pub file_name: String,
    /// Effective URL lifetime in seconds.
    pub expires_in: u64,
}

/// A presigned download URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedDownload {
    /// URL to GET the content from.
    pub url: String,
    /// Effective URL lifetime in seconds.
    pub expires_in: u64,
}

/// Request to update file annotations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMetadataRequest {
    /// Replacement tag set (trimmed, de-duplicated).
    pub tags: Option<Vec<String>>,
    /// Wholesale metadata replacement. Must be a JSON object.
    pub metadata: Option<serde_json::Value>,
}

/// How a permanent delete actually completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Object and record both removed.
    Permanent,
    /// Object removed, but the record could only be soft-deleted.
    SoftDeleteFallback,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        files: Arc<dyn FileStore>,
        folders: Arc<dyn FolderStore>,
        objects: Arc<dyn ObjectStore>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            files,
            folders,
            objects,
            container: container.into(),
        }
    }

    /// Uploads file content and creates its record.
    ///
    /// The object PUT happens first; if the record insert then fails the
    /// object is removed again so no orphan is left behind.
    pub async fn upload(&self, ctx: &RequestContext, req: UploadRequest) -> AppResult<FileRecord> {
        let original_name = req.original_name.trim().to_string();
        if original_name.is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }

        if let Some(folder_id) = req.folder_id {
            self.owned_folder(ctx.user_id, folder_id)
                .await
                .map_err(|_| AppError::not_found("Destination folder not found"))?;
        }

        let file_name = storage_file_name(&original_name);
        let object_key = keys::file_key(ctx.user_id, &file_name);
        let file_size = req.data.len() as i64;

        self.objects
            .put(&self.container, &object_key, req.data, &req.mime_type)
            .await?;

        let record = CreateFileRecord {
            owner_id: ctx.user_id,
            folder_id: req.folder_id,
            file_name,
            original_name,
            file_size,
            mime_type: req.mime_type,
            object_key: object_key.clone(),
            object_container: self.container.clone(),
        };

        match self.files.create(&record).await {
            Ok(file) => {
                info!(
                    user_id = %ctx.user_id,
                    file_id = %file.id,
                    object_key = %object_key,
                    bytes = file_size,
                    "File uploaded"
                );
                Ok(file)
            }
            Err(db_err) => {
                if let Err(cleanup_err) =
                    self.objects.delete(&self.container, &object_key).await
                {
                    error!(
                        object_key = %object_key,
                        error = %cleanup_err,
                        "Failed to remove object after record insert failed"
                    );
                }
                Err(db_err)
            }
        }
    }

    /// Issues a presigned PUT URL for a direct client upload.
    pub async fn issue_presigned_upload(
        &self,
        ctx: &RequestContext,
        req: PresignedUploadRequest,
    ) -> AppResult<PresignedUpload> {
        let original_name = req.original_name.trim();
        if original_name.is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }

        let file_name = storage_file_name(original_name);
        let object_key = keys::file_key(ctx.user_id, &file_name);
        let expires_in = clamp_expiration(req.expiration_seconds);

        let url = self
            .objects
            .presign_put(
                &self.container,
                &object_key,
                Duration::from_secs(expires_in),
                Some(&req.mime_type),
            )
            .await?;

        Ok(PresignedUpload {
            url,
            object_key,
            file_name,
            expires_in,
        })
    }

    /// Lists the caller's live files with filter, sort, and paging. The
    /// aggregates cover the whole matching set, not just this window.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        query: FileQuery,
    ) -> AppResult<FileListing> {
        let mut query = query;
        query.limit = query.limit.clamp(LIST_LIMIT_MIN, LIST_LIMIT_MAX);
        self.files.list(ctx.user_id, &query).await
    }

    /// Moves a file to another folder (or the root).
    ///
    /// Metadata-only: the object key encodes the owner, not the folder,
    /// so the object store is never touched by a move.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        destination_folder_id: Option<Uuid>,
    ) -> AppResult<FileRecord> {
        let file = self.owned_file(ctx.user_id, file_id).await?;

        if let Some(folder_id) = destination_folder_id {
            self.owned_folder(ctx.user_id, folder_id)
                .await
                .map_err(|_| AppError::not_found("Destination folder not found"))?;
        }

        let moved = self.files.set_folder(file.id, destination_folder_id).await?;

        info!(
            user_id = %ctx.user_id,
            file_id = %file_id,
            destination = ?destination_folder_id,
            "File moved"
        );

        Ok(moved)
    }

    /// Narrow per-file access check used outside the share-token path:
    /// the owner of a live record, or a principal in its direct
    /// `shared_with` set.
    pub async fn can_access(
        &self,
        principal_id: Uuid,
        file_id: Uuid,
        _action: SharePermission,
    ) -> AppResult<bool> {
        let Some(file) = self.files.find_by_id(file_id).await? else {
            return Ok(false);
        };
        if file.is_deleted {
            return Ok(false);
        }
        Ok(file.owner_id == principal_id || file.shared_with.contains(&principal_id))
    }

    /// Issues a presigned download URL after an access check.
    ///
    /// A missing object surfaces as a storage error, deliberately
    /// distinct from the access denial.
    pub async fn issue_presigned_download(
        &self,
        file_id: Uuid,
        caller: Uuid,
        expiration_seconds: u64,
    ) -> AppResult<PresignedDownload> {
        if !self
            .can_access(caller, file_id, SharePermission::Download)
            .await?
        {
            return Err(AppError::access_denied(
                "You do not have access to this file",
            ));
        }

        let file = self
            .files
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::access_denied("You do not have access to this file"))?;

        if self
            .objects
            .head(&file.object_container, &file.object_key)
            .await?
            .is_none()
        {
            return Err(AppError::storage(format!(
                "Object missing for file {file_id}"
            )));
        }

        let expires_in = clamp_expiration(expiration_seconds);
        let url = self
            .objects
            .presign_get(
                &file.object_container,
                &file.object_key,
                Duration::from_secs(expires_in),
            )
            .await?;

        Ok(PresignedDownload { url, expires_in })
    }

    /// Updates tags and/or replaces the metadata map.
    pub async fn update_metadata(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        req: UpdateMetadataRequest,
    ) -> AppResult<FileRecord> {
        let file = self.owned_file(ctx.user_id, file_id).await?;

        if let Some(metadata) = &req.metadata {
            if !metadata.is_object() {
                return Err(AppError::validation("metadata must be a JSON object"));
            }
        }

        let tags = req.tags.map(normalize_tags);

        self.files
            .update_annotations(file.id, tags.as_deref(), req.metadata.as_ref())
            .await
    }

    /// Soft-deletes a file. This is the default delete path; the object
    /// stays in place for recovery.
    pub async fn delete_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<()> {
        let file = self.owned_file(ctx.user_id, file_id).await?;
        self.files.mark_deleted(file.id).await?;
        info!(user_id = %ctx.user_id, file_id = %file_id, "File soft-deleted");
        Ok(())
    }

    /// Permanently deletes a file: object first, then the record.
    ///
    /// If the record delete fails after the object is gone, the record is
    /// soft-deleted instead so it cannot point at a missing object; that
    /// fallback is flagged in both the return value and the logs.
    pub async fn permanent_delete(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> AppResult<DeleteOutcome> {
        let file = self
            .files
            .find_by_id(file_id)
            .await?
            .filter(|f| f.owner_id == ctx.user_id)
            .ok_or_else(|| AppError::not_found("File not found"))?;

        self.objects
            .delete(&file.object_container, &file.object_key)
            .await?;

        match self.files.delete(file.id).await {
            Ok(_) => {
                info!(
                    user_id = %ctx.user_id,
                    file_id = %file_id,
                    object_key = %file.object_key,
                    "File permanently deleted"
                );
                Ok(DeleteOutcome::Permanent)
            }
            Err(db_err) => {
                warn!(
                    file_id = %file.id,
                    error = %db_err,
                    fallback = "soft_delete",
                    "Record delete failed after object removal; falling back to soft delete"
                );
                match self.files.mark_deleted(file.id).await {
                    Ok(_) => Ok(DeleteOutcome::SoftDeleteFallback),
                    Err(fallback_err) => Err(AppError::consistency(format!(
                        "Object for file {} was deleted but the record could not be \
                         removed or soft-deleted: {fallback_err}",
                        file.id
                    ))),
                }
            }
        }
    }

    /// Fetch a live file owned by the caller. Missing and not-owned
    /// collapse into the same not-found.
    async fn owned_file(&self, owner_id: Uuid, file_id: Uuid) -> AppResult<FileRecord> {
        self.files
            .find_by_id(file_id)
            .await?
            .filter(|f| f.owner_id == owner_id && !f.is_deleted)
            .ok_or_else(|| AppError::not_found("File not found"))
    }

    /// Fetch a live folder owned by the caller.
    async fn owned_folder(
        &self,
        owner_id: Uuid,
        folder_id: Uuid,
    ) -> AppResult<stowage_entity::folder::FolderNode> {
        self.folders
            .find_by_id(folder_id)
            .await?
            .filter(|f| f.owner_id == owner_id && !f.is_deleted)
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }
}

/// Generate the storage name for an upload: a fresh UUID with the
/// original extension preserved when it looks sane.
fn storage_file_name(original_name: &str) -> String {
    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10)
        .unwrap_or("bin");

    format!("{}.{}", Uuid::new_v4(), extension.to_lowercase())
}

/// Trim, drop empties, and de-duplicate while preserving order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim();
        if !trimmed.is_empty() && !cleaned.iter().any(|existing| existing == trimmed) {
            cleaned.push(trimmed.to_string());
        }
    }
    cleaned
}
