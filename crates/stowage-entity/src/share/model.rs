//! Share grant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::permission::SharePermission;

/// What kind of item a grant covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "shared_item_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SharedItemType {
    /// A single file record.
    File,
    /// A folder subtree.
    Folder,
}

/// A capability over one file or folder subtree.
///
/// The token is the sole lookup key for anonymous access. Revocation is
/// a one-way transition; a revoked grant resolves exactly like one that
/// never existed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShareGrant {
    /// Unique share identifier.
    pub id: Uuid,
    /// Issuing owner. Must own the shared item.
    pub owner_id: Uuid,
    /// Kind of item shared.
    pub item_type: SharedItemType,
    /// ID of the shared file or folder.
    pub item_id: Uuid,
    /// Unguessable secret used for anonymous resolution.
    pub token: String,
    /// Granted capabilities. Always a non-empty normalized set.
    pub permissions: Vec<SharePermission>,
    /// Recipient allowlist (lowercase). Empty = unrestricted.
    pub allowed_emails: Vec<String>,
    /// Instant at/after which the grant is inert (None = never).
    pub expires_at: Option<DateTime<Utc>>,
    /// Terminal revocation flag.
    pub is_revoked: bool,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
    /// When the grant was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ShareGrant {
    /// Whether the grant is past its expiry instant.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires| expires <= Utc::now())
    }

    /// Whether the grant currently resolves for anonymous access.
    pub fn is_resolvable(&self) -> bool {
        !self.is_revoked && !self.is_expired()
    }

    /// Whether the grant carries the given permission.
    pub fn permits(&self, permission: SharePermission) -> bool {
        self.permissions.contains(&permission)
    }
}

/// Data required to create a new share grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShareGrant {
    /// Issuing owner.
    pub owner_id: Uuid,
    /// Kind of item shared.
    pub item_type: SharedItemType,
    /// ID of the shared item.
    pub item_id: Uuid,
    /// Generated token.
    pub token: String,
    /// Normalized permission set.
    pub permissions: Vec<SharePermission>,
    /// Normalized recipient allowlist.
    pub allowed_emails: Vec<String>,
    /// Expiry instant (None = never).
    pub expires_at: Option<DateTime<Utc>>,
}
