//! Store traits and their PostgreSQL implementations.
//!
//! Services are written against the traits so the backend can be swapped
//! for the in-memory implementation in tests; nothing above this crate
//! sees SQL.

use async_trait::async_trait;
use uuid::Uuid;

use stowage_core::result::AppResult;
use stowage_core::types::{ListRange, Page};
use stowage_entity::file::{CreateFileRecord, FileListing, FileQuery, FileRecord};
use stowage_entity::folder::{CreateFolderNode, FolderNode};
use stowage_entity::share::{CreateShareGrant, ShareGrant};

pub mod file;
pub mod folder;
pub mod share;

pub use file::FileRepository;
pub use folder::FolderRepository;
pub use share::ShareRepository;

/// Persistence operations for folder nodes.
///
/// All lookups that take an `owner_id` are scoped to that owner and
/// exclude soft-deleted rows unless stated otherwise.
#[async_trait]
pub trait FolderStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a folder by ID, deleted or not.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FolderNode>>;

    /// Find a live sibling with the given exact name under a parent.
    async fn find_sibling(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<FolderNode>>;

    /// List live immediate children of a parent (or root), name-ordered.
    async fn list_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<FolderNode>>;

    /// Create a new folder node.
    async fn create(&self, data: &CreateFolderNode) -> AppResult<FolderNode>;

    /// Rename a folder node.
    async fn rename(&self, id: Uuid, new_name: &str) -> AppResult<FolderNode>;

    /// Mark every listed node deleted. Returns the number of rows that
    /// actually transitioned.
    async fn mark_subtree_deleted(&self, ids: &[Uuid]) -> AppResult<u64>;
}

/// Persistence operations for file records.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a file by ID, deleted or not.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileRecord>>;

    /// Create a new file record.
    async fn create(&self, data: &CreateFileRecord) -> AppResult<FileRecord>;

    /// List live files matching the query, plus aggregates over the
    /// unpaged matching set.
    async fn list(&self, owner_id: Uuid, query: &FileQuery) -> AppResult<FileListing>;

    /// Live files directly inside one folder (or root), name-ordered.
    async fn list_by_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        limit: i64,
    ) -> AppResult<Vec<FileRecord>>;

    /// Reassign the containing folder, touching `last_modified`.
    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<FileRecord>;

    /// Replace tags and/or metadata, touching `last_modified`.
    async fn update_annotations(
        &self,
        id: Uuid,
        tags: Option<&[String]>,
        metadata: Option<&serde_json::Value>,
    ) -> AppResult<FileRecord>;

    /// Soft-delete a file. Returns whether the row transitioned.
    async fn mark_deleted(&self, id: Uuid) -> AppResult<bool>;

    /// Hard-delete a file row. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Persistence operations for share grants.
#[async_trait]
pub trait ShareStore: Send + Sync + std::fmt::Debug + 'static {
    /// Find a grant by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ShareGrant>>;

    /// Find a grant by its token.
    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareGrant>>;

    /// Create a new grant. Token collisions surface as conflicts.
    async fn create(&self, data: &CreateShareGrant) -> AppResult<ShareGrant>;

    /// List grants issued by an owner, newest first.
    async fn list_by_owner(&self, owner_id: Uuid, range: &ListRange)
    -> AppResult<Page<ShareGrant>>;

    /// Persist permission/expiry/allowlist changes.
    async fn update(&self, grant: &ShareGrant) -> AppResult<ShareGrant>;

    /// Flip `is_revoked` on a not-yet-revoked grant. Returns whether this
    /// call changed state.
    async fn revoke(&self, id: Uuid) -> AppResult<bool>;
}
