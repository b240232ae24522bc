//! In-memory share store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::{ListRange, Page};
use stowage_entity::share::{CreateShareGrant, ShareGrant};

use crate::repositories::ShareStore;

/// In-memory share store.
#[derive(Debug, Default)]
pub struct MemoryShareStore {
    shares: RwLock<HashMap<Uuid, ShareGrant>>,
}

impl MemoryShareStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ShareGrant>> {
        Ok(self.shares.read().await.get(&id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<ShareGrant>> {
        Ok(self
            .shares
            .read()
            .await
            .values()
            .find(|s| s.token == token)
            .cloned())
    }

    async fn create(&self, data: &CreateShareGrant) -> AppResult<ShareGrant> {
        let mut shares = self.shares.write().await;

        if shares.values().any(|s| s.token == data.token) {
            return Err(AppError::conflict("Share token already exists"));
        }

        let now = Utc::now();
        let grant = ShareGrant {
            id: Uuid::new_v4(),
            owner_id: data.owner_id,
            item_type: data.item_type,
            item_id: data.item_id,
            token: data.token.clone(),
            permissions: data.permissions.clone(),
            allowed_emails: data.allowed_emails.clone(),
            expires_at: data.expires_at,
            is_revoked: false,
            created_at: now,
            updated_at: now,
        };
        shares.insert(grant.id, grant.clone());
        Ok(grant)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        range: &ListRange,
    ) -> AppResult<Page<ShareGrant>> {
        let range = range.clamped();
        let shares = self.shares.read().await;

        let mut owned: Vec<ShareGrant> = shares
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = owned.len() as u64;
        let window: Vec<ShareGrant> = owned
            .into_iter()
            .skip(range.offset as usize)
            .take(range.limit as usize)
            .collect();

        Ok(Page::new(window, total))
    }

    async fn update(&self, grant: &ShareGrant) -> AppResult<ShareGrant> {
        let mut shares = self.shares.write().await;
        let stored = shares
            .get_mut(&grant.id)
            .ok_or_else(|| AppError::not_found(format!("Share {} not found", grant.id)))?;
        stored.permissions = grant.permissions.clone();
        stored.allowed_emails = grant.allowed_emails.clone();
        stored.expires_at = grant.expires_at;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn revoke(&self, id: Uuid) -> AppResult<bool> {
        let mut shares = self.shares.write().await;
        match shares.get_mut(&id) {
            Some(grant) if !grant.is_revoked => {
                grant.is_revoked = true;
                grant.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
