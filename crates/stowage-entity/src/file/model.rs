//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata for one uploaded object.
///
/// The binary content lives in the object store at `object_key` inside
/// `object_container`; this record carries everything else. Moving a file
/// between folders only reassigns `folder_id` — the object key encodes
/// the owner, not the folder, and never changes after upload.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    /// Unique file identifier.
    pub id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
    /// Containing folder (None = root).
    pub folder_id: Option<Uuid>,
    /// System-generated storage name (uuid + original extension).
    pub file_name: String,
    /// Name the file was uploaded with.
    pub original_name: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME content type.
    pub mime_type: String,
    /// Opaque locator in the object store. Globally unique.
    pub object_key: String,
    /// Bucket/container holding the object.
    pub object_container: String,
    /// When the file was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// When the metadata was last modified.
    pub last_modified: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// User-assigned tags.
    pub tags: Vec<String>,
    /// Open key-value metadata. Always a JSON object.
    pub metadata: serde_json::Value,
    /// Principals granted direct access outside the share-token mechanism.
    pub shared_with: Vec<Uuid>,
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileRecord {
    /// The file owner.
    pub owner_id: Uuid,
    /// Containing folder (None = root).
    pub folder_id: Option<Uuid>,
    /// System-generated storage name.
    pub file_name: String,
    /// Name the file was uploaded with.
    pub original_name: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME content type.
    pub mime_type: String,
    /// Object store key.
    pub object_key: String,
    /// Object store container.
    pub object_container: String,
}
