//! Share grant lifecycle: create, update, revoke, list.
//!
//! Everything here is owner-scoped. Ownership failures during creation
//! collapse "does not exist" and "not yours" into one denial so callers
//! cannot probe for other users' items; once a caller *is* the owner,
//! lookups of their own grants return a real not-found.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::types::{ListRange, Page};
use stowage_database::repositories::{FileStore, FolderStore, ShareStore};
use stowage_entity::share::{CreateShareGrant, ShareGrant, SharePermission, SharedItemType};

use super::token;
use crate::context::RequestContext;

/// Manages share grant creation, updates, and revocation.
#[derive(Debug, Clone)]
pub struct ShareService {
    /// Share store.
    shares: Arc<dyn ShareStore>,
    /// File store, for ownership validation.
    files: Arc<dyn FileStore>,
    /// Folder store, for ownership validation.
    folders: Arc<dyn FolderStore>,
    /// Base URL used to construct share access URLs.
    public_base_url: String,
}

/// Request to create a new share grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShareRequest {
    /// Kind of item to share.
    pub item_type: SharedItemType,
    /// The file or folder to share.
    pub item_id: Uuid,
    /// Requested permissions. Empty or invalid input normalizes to
    /// `{view}`.
    #[serde(default)]
    pub permissions: Vec<SharePermission>,
    /// Optional expiry. Must be strictly in the future.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional recipient allowlist.
    #[serde(default)]
    pub allowed_emails: Vec<String>,
}

/// Request to update an existing share grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateShareRequest {
    /// Replace the permission set.
    #[serde(default)]
    pub permissions: Option<Vec<SharePermission>>,
    /// Replace the expiry (`Some(None)` clears it).
    #[serde(default)]
    pub expires_at: Option<Option<DateTime<Utc>>>,
    /// Replace the recipient allowlist.
    #[serde(default)]
    pub allowed_emails: Option<Vec<String>>,
}

/// A freshly created grant plus its access URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedShare {
    /// The stored grant.
    pub grant: ShareGrant,
    /// URL an anonymous recipient can open.
    pub access_url: String,
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        shares: Arc<dyn ShareStore>,
        files: Arc<dyn FileStore>,
        folders: Arc<dyn FolderStore>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            shares,
            files,
            folders,
            public_base_url: public_base_url.into(),
        }
    }

    /// Creates a share grant over a file or folder the caller owns.
    pub async fn create_share(
        &self,
        ctx: &RequestContext,
        req: CreateShareRequest,
    ) -> AppResult<CreatedShare> {
        self.assert_owned_item(ctx.user_id, req.item_type, req.item_id)
            .await?;

        if let Some(expires_at) = req.expires_at {
            if expires_at <= Utc::now() {
                return Err(AppError::validation("Share expiry must be in the future"));
            }
        }

        let permissions = SharePermission::normalize(&req.permissions);
        let allowed_emails = normalize_emails(req.allowed_emails);
        let token = token::generate_token();

        let grant = self
            .shares
            .create(&CreateShareGrant {
                owner_id: ctx.user_id,
                item_type: req.item_type,
                item_id: req.item_id,
                token,
                permissions,
                allowed_emails,
                expires_at: req.expires_at,
            })
            .await?;

        let access_url = format!(
            "{}/s/{}",
            self.public_base_url.trim_end_matches('/'),
            grant.token
        );

        info!(
            user_id = %ctx.user_id,
            share_id = %grant.id,
            item_type = ?grant.item_type,
            item_id = %grant.item_id,
            "Share created"
        );

        Ok(CreatedShare { grant, access_url })
    }

    /// Fetches one of the caller's own grants.
    pub async fn get_share(&self, ctx: &RequestContext, share_id: Uuid) -> AppResult<ShareGrant> {
        self.owned_share(ctx.user_id, share_id).await
    }

    /// Lists grants issued by the caller, newest first.
    pub async fn list_shares(
        &self,
        ctx: &RequestContext,
        range: ListRange,
    ) -> AppResult<Page<ShareGrant>> {
        self.shares.list_by_owner(ctx.user_id, &range).await
    }

    /// Updates permissions, expiry, and/or the allowlist of a grant.
    pub async fn update_share(
        &self,
        ctx: &RequestContext,
        share_id: Uuid,
        req: UpdateShareRequest,
    ) -> AppResult<ShareGrant> {
        let mut grant = self.owned_share(ctx.user_id, share_id).await?;

        if grant.is_revoked {
            return Err(AppError::conflict("Share has been revoked"));
        }

        if let Some(permissions) = &req.permissions {
            grant.permissions = SharePermission::normalize(permissions);
        }
        if let Some(expires_at) = req.expires_at {
            if let Some(instant) = expires_at {
                if instant <= Utc::now() {
                    return Err(AppError::validation("Share expiry must be in the future"));
                }
            }
            grant.expires_at = expires_at;
        }
        if let Some(emails) = req.allowed_emails {
            grant.allowed_emails = normalize_emails(emails);
        }

        let updated = self.shares.update(&grant).await?;

        info!(user_id = %ctx.user_id, share_id = %share_id, "Share updated");

        Ok(updated)
    }

    /// Revokes a grant. Returns whether *this call* changed state: a
    /// missing, unowned, or already-revoked grant yields `false`, never
    /// an error.
    pub async fn revoke_share(&self, ctx: &RequestContext, share_id: Uuid) -> AppResult<bool> {
        let Some(grant) = self.shares.find_by_id(share_id).await? else {
            return Ok(false);
        };
        if grant.owner_id != ctx.user_id || grant.is_revoked {
            return Ok(false);
        }

        let changed = self.shares.revoke(grant.id).await?;
        if changed {
            info!(user_id = %ctx.user_id, share_id = %share_id, "Share revoked");
        }
        Ok(changed)
    }

    /// Validate the item exists, is live, and belongs to the caller.
    /// Missing and not-owned produce the same denial.
    async fn assert_owned_item(
        &self,
        owner_id: Uuid,
        item_type: SharedItemType,
        item_id: Uuid,
    ) -> AppResult<()> {
        let owned = match item_type {
            SharedItemType::File => self
                .files
                .find_by_id(item_id)
                .await?
                .map(|f| f.owner_id == owner_id && !f.is_deleted)
                .unwrap_or(false),
            SharedItemType::Folder => self
                .folders
                .find_by_id(item_id)
                .await?
                .map(|f| f.owner_id == owner_id && !f.is_deleted)
                .unwrap_or(false),
        };

        if owned {
            Ok(())
        } else {
            Err(AppError::access_denied("You cannot share this item"))
        }
    }

    async fn owned_share(&self, owner_id: Uuid, share_id: Uuid) -> AppResult<ShareGrant> {
        self.shares
            .find_by_id(share_id)
            .await?
            .filter(|s| s.owner_id == owner_id)
            .ok_or_else(|| AppError::not_found("Share not found"))
    }
}

/// Lowercase and trim one email address.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize an allowlist: trim, lowercase, drop empties, de-duplicate.
fn normalize_emails(emails: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(emails.len());
    for email in emails {
        let normalized = normalize_email(&email);
        if !normalized.is_empty() && !cleaned.contains(&normalized) {
            cleaned.push(normalized);
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_emails() {
        let emails = vec![
            " Alice@Example.COM ".to_string(),
            "bob@example.com".to_string(),
            "alice@example.com".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(
            normalize_emails(emails),
            vec!["alice@example.com", "bob@example.com"]
        );
    }
}
