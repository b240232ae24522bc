//! Share permission set.

use serde::{Deserialize, Serialize};

/// One capability a share grant can carry.
///
/// Each action checks its own bit: `Edit` does not imply `View` or
/// `Download`, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "share_permission", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    /// Read item metadata.
    View,
    /// Obtain presigned download URLs.
    Download,
    /// Write-capable operations.
    Edit,
}

impl SharePermission {
    /// Wire/display name of this permission.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Download => "download",
            Self::Edit => "edit",
        }
    }

    /// Normalize a permission list: de-duplicate, order canonically, and
    /// default to `{View}` when the input is empty.
    pub fn normalize(permissions: &[SharePermission]) -> Vec<SharePermission> {
        let mut normalized = Vec::with_capacity(3);
        for candidate in [Self::View, Self::Download, Self::Edit] {
            if permissions.contains(&candidate) {
                normalized.push(candidate);
            }
        }
        if normalized.is_empty() {
            normalized.push(Self::View);
        }
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_defaults_to_view() {
        assert_eq!(
            SharePermission::normalize(&[]),
            vec![SharePermission::View]
        );
    }

    #[test]
    fn test_deduplicates_and_orders() {
        let normalized = SharePermission::normalize(&[
            SharePermission::Edit,
            SharePermission::View,
            SharePermission::View,
        ]);
        assert_eq!(
            normalized,
            vec![SharePermission::View, SharePermission::Edit]
        );
    }

    #[test]
    fn test_full_set() {
        let normalized = SharePermission::normalize(&[
            SharePermission::Download,
            SharePermission::Edit,
            SharePermission::View,
        ]);
        assert_eq!(
            normalized,
            vec![
                SharePermission::View,
                SharePermission::Download,
                SharePermission::Edit
            ]
        );
    }
}
