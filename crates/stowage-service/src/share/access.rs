//! Token resolution and the access decision for anonymous requests.
//!
//! Resolution collapses unknown, revoked, and expired tokens — and
//! tokens whose item has since vanished — into one indistinguishable
//! not-found, so holders of dead links cannot probe what used to exist.
//! Allowlist failures are the one outcome kept distinct: the share is
//! real, the recipient just is not on it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::object_store::ObjectStore;
use stowage_database::repositories::{FileStore, FolderStore, ShareStore};
use stowage_entity::file::FileRecord;
use stowage_entity::folder::FolderNode;
use stowage_entity::share::{ShareGrant, SharePermission, SharedItemType};

use super::service::normalize_email;
use crate::file::service::clamp_expiration;

/// Hard bound on folder-subtree traversal for recursive share downloads.
const MAX_SHARE_FOLDERS: usize = 256;
/// Maximum total files returned for one folder-share download.
const MAX_SHARE_ITEMS: usize = 1_000;

/// Message for every collapsed resolution failure.
const SHARE_NOT_FOUND: &str = "Share not found";

/// Resolves share tokens and evaluates anonymous access.
#[derive(Debug, Clone)]
pub struct ShareAccessService {
    /// Share store.
    shares: Arc<dyn ShareStore>,
    /// File store.
    files: Arc<dyn FileStore>,
    /// Folder store.
    folders: Arc<dyn FolderStore>,
    /// Object store gateway, for presigned URL issuance.
    objects: Arc<dyn ObjectStore>,
}

/// The item a resolved grant points at.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SharedItem {
    /// A single file record.
    File(FileRecord),
    /// A folder subtree root.
    Folder(FolderNode),
}

/// A grant that resolved successfully, plus its item's current metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedShare {
    /// The grant.
    pub grant: ShareGrant,
    /// The live item it covers.
    pub item: SharedItem,
}

/// Options for a token-based download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareDownloadRequest {
    /// Descend into subfolders for folder grants.
    #[serde(default)]
    pub recursive: bool,
    /// Requested URL lifetime in seconds (clamped).
    #[serde(default = "default_expiration")]
    pub expiration_seconds: u64,
}

impl Default for ShareDownloadRequest {
    fn default() -> Self {
        Self {
            recursive: false,
            expiration_seconds: default_expiration(),
        }
    }
}

fn default_expiration() -> u64 {
    3_600
}

/// One presigned file in a download response.
#[derive(Debug, Clone, Serialize)]
pub struct PresignedFile {
    /// File record ID.
    pub file_id: Uuid,
    /// Original upload name.
    pub file_name: String,
    /// Presigned GET URL.
    pub url: String,
    /// Effective URL lifetime in seconds.
    pub expires_in: u64,
}

/// Presigned URLs for a folder-share download.
#[derive(Debug, Clone, Serialize)]
pub struct FolderDownload {
    /// One URL per reachable file.
    pub files: Vec<PresignedFile>,
    /// Files skipped because URL generation failed.
    pub skipped: u64,
    /// True when the item cap cut the enumeration short.
    pub truncated: bool,
}

/// Result of a token-based download request.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShareDownload {
    /// A single-file grant: one URL.
    File(PresignedFile),
    /// A folder grant: one URL per file under the subtree.
    Folder(FolderDownload),
}

impl ShareAccessService {
    /// Creates a new share access service.
    pub fn new(
        shares: Arc<dyn ShareStore>,
        files: Arc<dyn FileStore>,
        folders: Arc<dyn FolderStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            shares,
            files,
            folders,
            objects,
        }
    }

    /// Resolves a token into its grant and the item's current metadata.
    pub async fn resolve_token(&self, token: &str) -> AppResult<ResolvedShare> {
        let grant = self
            .shares
            .find_by_token(token)
            .await?
            .ok_or_else(|| AppError::not_found(SHARE_NOT_FOUND))?;

        if !grant.is_resolvable() {
            return Err(AppError::not_found(SHARE_NOT_FOUND));
        }

        let item = match grant.item_type {
            SharedItemType::File => self
                .files
                .find_by_id(grant.item_id)
                .await?
                .filter(|f| !f.is_deleted)
                .map(SharedItem::File),
            SharedItemType::Folder => self
                .folders
                .find_by_id(grant.item_id)
                .await?
                .filter(|f| !f.is_deleted)
                .map(SharedItem::Folder),
        }
        .ok_or_else(|| AppError::not_found(SHARE_NOT_FOUND))?;

        Ok(ResolvedShare { grant, item })
    }

    /// The single access decision: may a request carrying this email
    /// perform `action` under this grant?
    ///
    /// Order matters: the allowlist is checked before the permission bit
    /// so a restricted recipient learns nothing about the grant's
    /// capabilities. Each action requires exactly its own bit.
    pub fn authorize(
        grant: &ShareGrant,
        supplied_email: Option<&str>,
        action: SharePermission,
    ) -> AppResult<()> {
        if !grant.allowed_emails.is_empty() {
            let email = supplied_email
                .map(normalize_email)
                .filter(|candidate| !candidate.is_empty())
                .ok_or_else(|| {
                    AppError::unauthorized_recipient(
                        "This share is restricted to specific recipients",
                    )
                })?;

            if !grant.allowed_emails.iter().any(|allowed| *allowed == email) {
                return Err(AppError::unauthorized_recipient(
                    "This share is restricted to specific recipients",
                ));
            }
        }

        if !grant.permits(action) {
            return Err(AppError::access_denied(format!(
                "Share does not permit {}",
                action.as_str()
            )));
        }

        Ok(())
    }

    /// Resolves a token for viewing.
    pub async fn view_via_token(
        &self,
        token: &str,
        supplied_email: Option<&str>,
    ) -> AppResult<ResolvedShare> {
        let resolved = self.resolve_token(token).await?;
        Self::authorize(&resolved.grant, supplied_email, SharePermission::View)?;
        Ok(resolved)
    }

    /// Resolves a token for downloading.
    ///
    /// A file grant yields one presigned URL. A folder grant enumerates
    /// the subtree (bounded) and yields one URL per file; a file whose
    /// URL generation fails is skipped, never fatal for the batch.
    pub async fn download_via_token(
        &self,
        token: &str,
        supplied_email: Option<&str>,
        req: ShareDownloadRequest,
    ) -> AppResult<ShareDownload> {
        let resolved = self.resolve_token(token).await?;
        Self::authorize(&resolved.grant, supplied_email, SharePermission::Download)?;

        let expires_in = clamp_expiration(req.expiration_seconds);

        match resolved.item {
            SharedItem::File(file) => {
                let url = self.presign_file(&file, expires_in).await?;
                Ok(ShareDownload::File(PresignedFile {
                    file_id: file.id,
                    file_name: file.original_name,
                    url,
                    expires_in,
                }))
            }
            SharedItem::Folder(folder) => {
                let owner = resolved.grant.owner_id;
                let folder_ids = self.collect_subtree(owner, folder.id, req.recursive).await?;

                let mut files = Vec::new();
                let mut skipped = 0u64;
                let mut truncated = false;

                'collect: for folder_id in folder_ids {
                    if files.len() >= MAX_SHARE_ITEMS {
                        truncated = true;
                        break;
                    }

                    let records = self
                        .files
                        .list_by_folder(owner, Some(folder_id), MAX_SHARE_ITEMS as i64)
                        .await?;

                    for file in records {
                        if files.len() >= MAX_SHARE_ITEMS {
                            truncated = true;
                            break 'collect;
                        }
                        match self.presign_file(&file, expires_in).await {
                            Ok(url) => files.push(PresignedFile {
                                file_id: file.id,
                                file_name: file.original_name,
                                url,
                                expires_in,
                            }),
                            Err(err) => {
                                skipped += 1;
                                warn!(
                                    file_id = %file.id,
                                    error = %err,
                                    "Skipping file in share download; URL generation failed"
                                );
                            }
                        }
                    }
                }

                Ok(ShareDownload::Folder(FolderDownload {
                    files,
                    skipped,
                    truncated,
                }))
            }
        }
    }

    /// Breadth-first folder enumeration, bounded by [`MAX_SHARE_FOLDERS`]
    /// so corrupt or adversarial trees cannot run away.
    async fn collect_subtree(
        &self,
        owner_id: Uuid,
        root: Uuid,
        recursive: bool,
    ) -> AppResult<Vec<Uuid>> {
        let mut ids = vec![root];
        if !recursive {
            return Ok(ids);
        }

        let mut queue = VecDeque::from([root]);
        'walk: while let Some(id) = queue.pop_front() {
            for child in self.folders.list_children(owner_id, Some(id)).await? {
                if ids.len() >= MAX_SHARE_FOLDERS {
                    warn!(
                        root = %root,
                        "Share subtree exceeded the folder traversal cap"
                    );
                    break 'walk;
                }
                ids.push(child.id);
                queue.push_back(child.id);
            }
        }
        Ok(ids)
    }

    async fn presign_file(&self, file: &FileRecord, expires_in: u64) -> AppResult<String> {
        self.objects
            .presign_get(
                &file.object_container,
                &file.object_key,
                Duration::from_secs(expires_in),
            )
            .await
    }
}
