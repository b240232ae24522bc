//! Share repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::types::{ListRange, Page};
use stowage_entity::share::{CreateShareGrant, ShareGrant};

use super::ShareStore;

/// PostgreSQL repository for share grants.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: PgPool,
}

impl ShareRepository {
    /// Create a new share repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ShareStore for ShareRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ShareGrant>> {
        sqlx::query_as::<_, ShareGrant>("SELECT * FROM shares WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find share", e))
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareGrant>> {
        sqlx::query_as::<_, ShareGrant>("SELECT * FROM shares WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find share by token", e)
            })
    }

    async fn create(&self, data: &CreateShareGrant) -> AppResult<ShareGrant> {
        sqlx::query_as::<_, ShareGrant>(
            "INSERT INTO shares (id, owner_id, item_type, item_id, token, permissions, \
             allowed_emails, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.owner_id)
        .bind(data.item_type)
        .bind(data.item_id)
        .bind(&data.token)
        .bind(&data.permissions)
        .bind(&data.allowed_emails)
        .bind(data.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("shares_token_key") =>
            {
                AppError::conflict("Share token already exists")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create share", e),
        })
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        range: &ListRange,
    ) -> AppResult<Page<ShareGrant>> {
        let range = range.clamped();

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shares WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count shares", e))?;

        let shares = sqlx::query_as::<_, ShareGrant>(
            "SELECT * FROM shares WHERE owner_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(owner_id)
        .bind(range.limit as i64)
        .bind(range.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list shares", e))?;

        Ok(Page::new(shares, total.max(0) as u64))
    }

    async fn update(&self, grant: &ShareGrant) -> AppResult<ShareGrant> {
        sqlx::query_as::<_, ShareGrant>(
            "UPDATE shares SET permissions = $2, allowed_emails = $3, expires_at = $4, \
             updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(grant.id)
        .bind(&grant.permissions)
        .bind(&grant.allowed_emails)
        .bind(grant.expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update share", e))?
        .ok_or_else(|| AppError::not_found(format!("Share {} not found", grant.id)))
    }

    async fn revoke(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE shares SET is_revoked = TRUE, updated_at = NOW() \
             WHERE id = $1 AND NOT is_revoked",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to revoke share", e))?;
        Ok(result.rows_affected() > 0)
    }
}
