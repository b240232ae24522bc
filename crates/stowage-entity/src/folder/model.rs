//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A node in a user's folder tree.
///
/// The logical hierarchy lives in `parent_id` links; the object store
/// mirrors it as a key-prefix tree. Soft deletion is terminal: a node
/// goes `ACTIVE -> DELETED` exactly once and never back.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FolderNode {
    /// Unique folder identifier.
    pub id: Uuid,
    /// The folder owner.
    pub owner_id: Uuid,
    /// Parent folder ID (null for root-level folders).
    pub parent_id: Option<Uuid>,
    /// Folder name. Unique among non-deleted siblings, case-sensitive.
    pub name: String,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl FolderNode {
    /// Check if this is a root-level folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new folder node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolderNode {
    /// The folder owner.
    pub owner_id: Uuid,
    /// Parent folder (None for root-level).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
}
