//! Folder CRUD with the object-store prefix tree kept in lockstep.
//!
//! The logical tree (rows linked by `parent_id`) and the key-prefix tree
//! under `folders/<owner>/` must stay bijective. Every structural
//! mutation therefore orders the object-store step strictly before the
//! database step: the object store is the harder system to roll back, so
//! its success gates the cheaper database change.

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::object_store::{ListPrefixRequest, ObjectStore};
use stowage_database::repositories::FolderStore;
use stowage_entity::folder::{CreateFolderNode, FolderNode};
use stowage_storage::keys;

use crate::context::RequestContext;

/// Hard bound on ancestry walks. Exceeding it means the parent links
/// form a cycle or the tree is otherwise corrupt.
const MAX_FOLDER_DEPTH: usize = 64;
/// Hard bound on subtree traversals during cascade deletes.
const MAX_SUBTREE_NODES: usize = 10_000;
/// Page size for object-store prefix listings.
const LIST_PAGE_SIZE: i32 = 1_000;
/// Content type written for zero-byte folder prefix markers.
const FOLDER_MARKER_CONTENT_TYPE: &str = "application/x-directory";

/// Manages the folder hierarchy and its object-store prefix mirror.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Folder store.
    folders: Arc<dyn FolderStore>,
    /// Object store gateway.
    objects: Arc<dyn ObjectStore>,
    /// Container holding markers and file objects.
    container: String,
}

/// Request to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderRequest {
    /// Parent folder ID (None for root-level).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
}

/// Outcome of a cascade soft delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtreeDeletion {
    /// Number of folder nodes marked deleted (root included).
    pub deleted: u64,
    /// False when the traversal cap was hit and the subtree was only
    /// partially processed.
    pub complete: bool,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        folders: Arc<dyn FolderStore>,
        objects: Arc<dyn ObjectStore>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            folders,
            objects,
            container: container.into(),
        }
    }

    /// Lists live immediate children of a folder, or root-level folders
    /// when no parent is given.
    pub async fn list_children(
        &self,
        ctx: &RequestContext,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<FolderNode>> {
        if let Some(parent_id) = parent_id {
            self.owned_folder(ctx.user_id, parent_id).await?;
        }
        self.folders.list_children(ctx.user_id, parent_id).await
    }

    /// Returns the ancestor names of a folder, root first, excluding the
    /// folder itself. An empty folder ID yields an empty path.
    pub async fn path_segments(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> AppResult<Vec<String>> {
        match folder_id {
            None => Ok(Vec::new()),
            Some(id) => {
                let folder = self.owned_folder(owner_id, id).await?;
                self.ancestor_names(owner_id, folder.parent_id).await
            }
        }
    }

    /// Creates a folder. The object-store prefix marker is written first;
    /// the row is only persisted once the marker exists, so a marker
    /// failure leaves no partial state.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<FolderNode> {
        let name = req.name.trim().to_string();
        if name.is_empty() || keys::sanitize_segment(&name).is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }

        if let Some(parent_id) = req.parent_id {
            self.owned_folder(ctx.user_id, parent_id)
                .await
                .map_err(|_| AppError::not_found("Parent folder not found"))?;
        }

        if self
            .folders
            .find_sibling(ctx.user_id, req.parent_id, &name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "Folder '{name}' already exists"
            )));
        }

        let mut segments = self.ancestor_names(ctx.user_id, req.parent_id).await?;
        segments.push(name.clone());
        let marker = self.prefix_for_segments(ctx.user_id, &segments);

        self.objects
            .put(
                &self.container,
                &marker,
                Bytes::new(),
                FOLDER_MARKER_CONTENT_TYPE,
            )
            .await?;

        let folder = self
            .folders
            .create(&CreateFolderNode {
                owner_id: ctx.user_id,
                parent_id: req.parent_id,
                name,
            })
            .await?;

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            prefix = %marker,
            "Folder created"
        );

        Ok(folder)
    }

    /// Renames a folder, rewriting every object key under its prefix.
    ///
    /// When the database update fails after the object subtree has
    /// already moved, the move is reversed; if that compensation fails
    /// too, the two stores have diverged and a consistency-risk error is
    /// surfaced instead of the original failure.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<FolderNode> {
        let new_name = new_name.trim();
        if new_name.is_empty() || keys::sanitize_segment(new_name).is_empty() {
            return Err(AppError::validation("Folder name cannot be empty"));
        }

        let folder = self.owned_folder(ctx.user_id, folder_id).await?;
        if folder.name == new_name {
            return Ok(folder);
        }

        if self
            .folders
            .find_sibling(ctx.user_id, folder.parent_id, new_name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "Folder '{new_name}' already exists"
            )));
        }

        let ancestors = self.ancestor_names(ctx.user_id, folder.parent_id).await?;

        let mut old_segments = ancestors.clone();
        old_segments.push(folder.name.clone());
        let old_prefix = self.prefix_for_segments(ctx.user_id, &old_segments);

        let mut new_segments = ancestors;
        new_segments.push(new_name.to_string());
        let new_prefix = self.prefix_for_segments(ctx.user_id, &new_segments);

        let moved = self.migrate_prefix(&old_prefix, &new_prefix).await?;
        self.objects
            .put(
                &self.container,
                &new_prefix,
                Bytes::new(),
                FOLDER_MARKER_CONTENT_TYPE,
            )
            .await?;

        match self.folders.rename(folder_id, new_name).await {
            Ok(renamed) => {
                info!(
                    user_id = %ctx.user_id,
                    folder_id = %folder_id,
                    objects_moved = moved,
                    new_name = %new_name,
                    "Folder renamed"
                );
                Ok(renamed)
            }
            Err(db_err) => {
                warn!(
                    folder_id = %folder_id,
                    error = %db_err,
                    "Folder rename failed in the database after objects moved; reversing"
                );
                if let Err(rollback_err) = self.migrate_prefix(&new_prefix, &old_prefix).await {
                    error!(
                        folder_id = %folder_id,
                        old_prefix = %old_prefix,
                        new_prefix = %new_prefix,
                        error = %rollback_err,
                        "Rename rollback failed; stores have diverged"
                    );
                    return Err(AppError::consistency(format!(
                        "Folder rename failed and the object rollback also failed; \
                         prefixes '{old_prefix}' and '{new_prefix}' need manual reconciliation"
                    )));
                }
                Err(db_err)
            }
        }
    }

    /// Soft-deletes a folder and all its descendants.
    ///
    /// The mirrored object subtree is removed first, then the node rows
    /// are marked deleted via a bounded breadth-first walk. Files inside
    /// the subtree are left to a higher-level cleanup job.
    pub async fn soft_delete_subtree(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
    ) -> AppResult<SubtreeDeletion> {
        let folder = self.owned_folder(ctx.user_id, folder_id).await?;

        let mut segments = self.ancestor_names(ctx.user_id, folder.parent_id).await?;
        segments.push(folder.name.clone());
        let prefix = self.prefix_for_segments(ctx.user_id, &segments);

        let removed_objects = self.delete_prefix(&prefix).await?;

        let mut ids = vec![folder.id];
        let mut queue = VecDeque::from([folder.id]);
        let mut complete = true;

        'walk: while let Some(id) = queue.pop_front() {
            for child in self.folders.list_children(ctx.user_id, Some(id)).await? {
                if ids.len() >= MAX_SUBTREE_NODES {
                    complete = false;
                    break 'walk;
                }
                ids.push(child.id);
                queue.push_back(child.id);
            }
        }

        let deleted = self.folders.mark_subtree_deleted(&ids).await?;

        if !complete {
            warn!(
                folder_id = %folder.id,
                visited = ids.len(),
                "Folder subtree exceeded the traversal cap; soft delete is partial"
            );
        }

        info!(
            user_id = %ctx.user_id,
            folder_id = %folder.id,
            folders_deleted = deleted,
            objects_removed = removed_objects,
            "Folder subtree soft-deleted"
        );

        Ok(SubtreeDeletion { deleted, complete })
    }

    /// Fetch a live folder owned by the caller. Missing and not-owned
    /// collapse into the same not-found.
    async fn owned_folder(&self, owner_id: Uuid, folder_id: Uuid) -> AppResult<FolderNode> {
        self.folders
            .find_by_id(folder_id)
            .await?
            .filter(|f| f.owner_id == owner_id && !f.is_deleted)
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Collect names from a node up to the root, returned root-first.
    /// Bounded by [`MAX_FOLDER_DEPTH`]; exceeding the bound or hitting a
    /// missing ancestor row is a consistency error, never an empty path.
    async fn ancestor_names(
        &self,
        owner_id: Uuid,
        start: Option<Uuid>,
    ) -> AppResult<Vec<String>> {
        let mut names = Vec::new();
        let mut current = start;
        let mut hops = 0usize;

        while let Some(id) = current {
            hops += 1;
            if hops > MAX_FOLDER_DEPTH {
                return Err(AppError::consistency(format!(
                    "Folder ancestry exceeds {MAX_FOLDER_DEPTH} hops at {id}; \
                     parent links may form a cycle"
                )));
            }

            let node = self.folders.find_by_id(id).await?.ok_or_else(|| {
                AppError::consistency(format!("Folder tree references missing ancestor {id}"))
            })?;
            if node.owner_id != owner_id {
                return Err(AppError::consistency(format!(
                    "Folder ancestry crosses owners at {id}"
                )));
            }

            names.push(node.name);
            current = node.parent_id;
        }

        names.reverse();
        Ok(names)
    }

    /// Build the sanitized object-store prefix for a folder path.
    fn prefix_for_segments(&self, owner_id: Uuid, segments: &[String]) -> String {
        let sanitized: Vec<String> = segments
            .iter()
            .map(|segment| keys::sanitize_segment(segment))
            .collect();
        keys::folder_prefix(owner_id, &sanitized)
    }

    /// Copy every object under `old_prefix` to the same suffix under
    /// `new_prefix`, deleting the originals. Returns the number moved.
    async fn migrate_prefix(&self, old_prefix: &str, new_prefix: &str) -> AppResult<u64> {
        let mut moved = 0u64;
        loop {
            let page = self
                .objects
                .list_prefix(
                    &self.container,
                    &ListPrefixRequest::recursive(old_prefix, LIST_PAGE_SIZE),
                )
                .await?;

            if page.objects.is_empty() {
                break;
            }

            for object in &page.objects {
                let suffix = object
                    .key
                    .strip_prefix(old_prefix)
                    .unwrap_or(object.key.as_str());
                let target = format!("{new_prefix}{suffix}");
                self.objects.copy(&self.container, &object.key, &target).await?;
                self.objects.delete(&self.container, &object.key).await?;
                moved += 1;
            }

            if !page.truncated {
                break;
            }
        }
        Ok(moved)
    }

    /// Delete every object under a prefix. Returns the number removed.
    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64> {
        let mut removed = 0u64;
        loop {
            let page = self
                .objects
                .list_prefix(
                    &self.container,
                    &ListPrefixRequest::recursive(prefix, LIST_PAGE_SIZE),
                )
                .await?;

            if page.objects.is_empty() {
                break;
            }

            for object in &page.objects {
                self.objects.delete(&self.container, &object.key).await?;
                removed += 1;
            }

            if !page.truncated {
                break;
            }
        }
        Ok(removed)
    }
}
