//! File listing query types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stowage_core::types::SortDirection;

use super::model::FileRecord;

/// Sortable columns for file listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSortField {
    /// Sort by upload timestamp.
    UploadedAt,
    /// Sort by storage file name.
    FileName,
    /// Sort by size in bytes.
    FileSize,
}

impl FileSortField {
    /// Return the SQL column for this field.
    pub fn as_column(&self) -> &'static str {
        match self {
            Self::UploadedAt => "uploaded_at",
            Self::FileName => "file_name",
            Self::FileSize => "file_size",
        }
    }
}

impl Default for FileSortField {
    fn default() -> Self {
        Self::UploadedAt
    }
}

/// Filter and paging parameters for file listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileQuery {
    /// Restrict to one folder when set.
    #[serde(default)]
    pub folder_id: Option<Uuid>,
    /// MIME type filter: either an exact type ("image/png") or a
    /// wildcard family ("image/*").
    #[serde(default)]
    pub mime_type_pattern: Option<String>,
    /// Maximum items to return. Clamped to `[1, 100]`.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Items to skip.
    #[serde(default)]
    pub offset: u64,
    /// Sort column.
    #[serde(default)]
    pub sort_by: FileSortField,
    /// Sort direction.
    #[serde(default)]
    pub sort_order: SortDirection,
}

impl FileQuery {
    /// Whether a file's MIME type matches this query's pattern.
    ///
    /// A trailing `/*` matches the whole family; anything else is an
    /// exact comparison. No pattern matches everything.
    pub fn mime_matches(&self, mime_type: &str) -> bool {
        match self.mime_type_pattern.as_deref() {
            None => true,
            Some(pattern) => match pattern.strip_suffix("/*") {
                Some(family) => mime_type
                    .split('/')
                    .next()
                    .is_some_and(|prefix| prefix == family),
                None => mime_type == pattern,
            },
        }
    }
}

impl Default for FileQuery {
    fn default() -> Self {
        Self {
            folder_id: None,
            mime_type_pattern: None,
            limit: default_limit(),
            offset: 0,
            sort_by: FileSortField::default(),
            sort_order: SortDirection::default(),
        }
    }
}

fn default_limit() -> u64 {
    25
}

/// One window of a file listing plus aggregates over the unpaged
/// matching set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListing {
    /// Files in this window.
    pub files: Vec<FileRecord>,
    /// Total files matching the filter, ignoring limit/offset.
    pub total_count: u64,
    /// Total bytes across all matching files, ignoring limit/offset.
    pub total_bytes: u64,
}
