//! Folder repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_entity::folder::{CreateFolderNode, FolderNode};

use super::FolderStore;

/// PostgreSQL repository for folder nodes.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderStore for FolderRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FolderNode>> {
        sqlx::query_as::<_, FolderNode>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    async fn find_sibling(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<FolderNode>> {
        let query = match parent_id {
            Some(_) => {
                "SELECT * FROM folders \
                 WHERE owner_id = $1 AND parent_id = $2 AND name = $3 AND NOT is_deleted"
            }
            None => {
                "SELECT * FROM folders \
                 WHERE owner_id = $1 AND $2::uuid IS NULL AND parent_id IS NULL \
                 AND name = $3 AND NOT is_deleted"
            }
        };

        sqlx::query_as::<_, FolderNode>(query)
            .bind(owner_id)
            .bind(parent_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find sibling", e))
    }

    async fn list_children(
        &self,
        owner_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> AppResult<Vec<FolderNode>> {
        let query = match parent_id {
            Some(_) => {
                "SELECT * FROM folders \
                 WHERE owner_id = $1 AND parent_id = $2 AND NOT is_deleted ORDER BY name ASC"
            }
            None => {
                "SELECT * FROM folders \
                 WHERE owner_id = $1 AND $2::uuid IS NULL AND parent_id IS NULL \
                 AND NOT is_deleted ORDER BY name ASC"
            }
        };

        sqlx::query_as::<_, FolderNode>(query)
            .bind(owner_id)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    async fn create(&self, data: &CreateFolderNode) -> AppResult<FolderNode> {
        sqlx::query_as::<_, FolderNode>(
            "INSERT INTO folders (id, owner_id, parent_id, name) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.owner_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("folders_owner_parent_name_key") =>
            {
                AppError::conflict(format!("Folder '{}' already exists", data.name))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create folder", e),
        })
    }

    async fn rename(&self, id: Uuid, new_name: &str) -> AppResult<FolderNode> {
        sqlx::query_as::<_, FolderNode>(
            "UPDATE folders SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename folder", e))?
        .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    async fn mark_subtree_deleted(&self, ids: &[Uuid]) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE folders SET is_deleted = TRUE, updated_at = NOW() \
             WHERE id = ANY($1) AND NOT is_deleted",
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to soft-delete folders", e)
        })?;
        Ok(result.rows_affected())
    }
}
