//! In-memory folder store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_entity::folder::{CreateFolderNode, FolderNode};

use crate::repositories::FolderStore;

/// In-memory folder store.
#[derive(Debug, Default)]
pub struct MemoryFolderStore {
    folders: RwLock<HashMap<Uuid, FolderNode>>,
}

impl MemoryFolderStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FolderStore for MemoryFolderStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FolderNode>> {
        Ok(self.folders.read().await.get(&id).cloned())
    }

    async fn find_sibling(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<FolderNode>> {
        Ok(self
            .folders
            .read()
            .await
            .values()
            .find(|f| {
                f.owner_id == owner_id
                    && f.parent_id == parent_id
                    && f.name == name
                    && !f.is_deleted
            })
            .cloned())
    }

    async fn list_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<FolderNode>> {
        let mut children: Vec<FolderNode> = self
            .folders
            .read()
            .await
            .values()
            .filter(|f| f.owner_id == owner_id && f.parent_id == parent_id && !f.is_deleted)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn create(&self, data: &CreateFolderNode) -> AppResult<FolderNode> {
        let mut folders = self.folders.write().await;

        let duplicate = folders.values().any(|f| {
            f.owner_id == data.owner_id
                && f.parent_id == data.parent_id
                && f.name == data.name
                && !f.is_deleted
        });
        if duplicate {
            return Err(AppError::conflict(format!(
                "Folder '{}' already exists",
                data.name
            )));
        }

        let now = Utc::now();
        let folder = FolderNode {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            parent_id: data.parent_id,
            name: data.name.clone(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn rename(&self, id: Uuid, new_name: &str) -> AppResult<FolderNode> {
        let mut folders = self.folders.write().await;
        let folder = folders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        folder.name = new_name.to_string();
        folder.updated_at = Utc::now();
        Ok(folder.clone())
    }

    async fn mark_subtree_deleted(&self, ids: &[Uuid]) -> AppResult<u64> {
        let mut folders = self.folders.write().await;
        let mut affected = 0;
        for id in ids {
            if let Some(folder) = folders.get_mut(id) {
                if !folder.is_deleted {
                    folder.is_deleted = true;
                    folder.updated_at = Utc::now();
                    affected += 1;
                }
            }
        }
        Ok(affected)
    }
}
