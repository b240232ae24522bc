//! In-memory file store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::SortDirection;
use stowage_entity::file::{CreateFileRecord, FileListing, FileQuery, FileRecord, FileSortField};

use crate::repositories::FileStore;

/// In-memory file store.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<Uuid, FileRecord>>,
}

impl MemoryFileStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, bypassing creation defaults. Test
    /// seeding helper.
    pub async fn insert_raw(&self, record: FileRecord) {
        self.files.write().await.insert(record.id, record);
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileRecord>> {
        Ok(self.files.read().await.get(&id).cloned())
    }

    async fn create(&self, data: &CreateFileRecord) -> AppResult<FileRecord> {
        let mut files = self.files.write().await;

        if files.values().any(|f| f.object_key == data.object_key) {
            return Err(AppError::conflict(format!(
                "Object key '{}' already exists",
                data.object_key
            )));
        }

        let now = Utc::now();
        let record = FileRecord {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            folder_id: data.folder_id,
            file_name: data.file_name.clone(),
            original_name: data.original_name.clone(),
            file_size: data.file_size,
            mime_type: data.mime_type.clone(),
            object_key: data.object_key.clone(),
            object_container: data.object_container.clone(),
            uploaded_at: now,
            last_modified: now,
            is_deleted: false,
            tags: Vec::new(),
            metadata: serde_json::json!({}),
            shared_with: Vec::new(),
        };
        files.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list(&self, owner_id: Uuid, query: &FileQuery) -> AppResult<FileListing> {
        let files = self.files.read().await;

        let mut matching: Vec<FileRecord> = files
            .values()
            .filter(|f| f.owner_id == owner_id && !f.is_deleted)
            .filter(|f| query.folder_id.is_none_or(|folder| f.folder_id == Some(folder)))
            .filter(|f| query.mime_matches(&f.mime_type))
            .cloned()
            .collect();

        let total_count = matching.len() as u64;
        let total_bytes = matching.iter().map(|f| f.file_size.max(0) as u64).sum();

        matching.sort_by(|a, b| {
            let ordering = match query.sort_by {
                FileSortField::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
                FileSortField::FileName => a.file_name.cmp(&b.file_name),
                FileSortField::FileSize => a.file_size.cmp(&b.file_size),
            };
            match query.sort_order {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let window: Vec<FileRecord> = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();

        Ok(FileListing {
            files: window,
            total_count,
            total_bytes,
        })
    }

    async fn list_by_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        limit: i64,
    ) -> AppResult<Vec<FileRecord>> {
        let files = self.files.read().await;
        let mut matching: Vec<FileRecord> = files
            .values()
            .filter(|f| f.owner_id == owner_id && f.folder_id == folder_id && !f.is_deleted)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        matching.truncate(limit.max(0) as usize);
        Ok(matching)
    }

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<FileRecord> {
        let mut files = self.files.write().await;
        let record = files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        record.folder_id = folder_id;
        record.last_modified = Utc::now();
        Ok(record.clone())
    }

    async fn update_annotations(
        &self,
        id: Uuid,
        tags: Option<&[String]>,
        metadata: Option<&serde_json::Value>,
    ) -> AppResult<FileRecord> {
        let mut files = self.files.write().await;
        let record = files
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        if let Some(tags) = tags {
            record.tags = tags.to_vec();
        }
        if let Some(metadata) = metadata {
            record.metadata = metadata.clone();
        }
        record.last_modified = Utc::now();
        Ok(record.clone())
    }

    async fn mark_deleted(&self, id: Uuid) -> AppResult<bool> {
        let mut files = self.files.write().await;
        match files.get_mut(&id) {
            Some(record) if !record.is_deleted => {
                record.is_deleted = true;
                record.last_modified = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.files.write().await.remove(&id).is_some())
    }
}
