//! Object key layout.
//!
//! Centralising key construction prevents typos and keeps the data
//! contract with the object store in one place:
//!
//! - file objects live at `<owner_id>/<file_name>`
//! - folder markers and their contents live under
//!   `folders/<owner_id>/<segment1>/<segment2>/.../`
//!
//! File keys encode the owner, never the folder, so moving a file is a
//! metadata-only operation. Folder renames rewrite every key under the
//! old prefix.

use uuid::Uuid;

/// Root prefix for all folder markers.
const FOLDER_ROOT: &str = "folders";

/// Key for one file object.
pub fn file_key(owner_id: Uuid, file_name: &str) -> String {
    format!("{owner_id}/{file_name}")
}

/// Prefix for a folder subtree, trailing slash included.
///
/// An empty segment list yields the owner's folder root prefix.
pub fn folder_prefix(owner_id: Uuid, segments: &[String]) -> String {
    let mut prefix = format!("{FOLDER_ROOT}/{owner_id}/");
    for segment in segments {
        prefix.push_str(segment);
        prefix.push('/');
    }
    prefix
}

/// Sanitize one path segment for use in an object key: trim, convert
/// backslashes to forward slashes, collapse internal whitespace runs to
/// single spaces, and strip leading/trailing slashes.
pub fn sanitize_segment(raw: &str) -> String {
    let replaced = raw.replace('\\', "/");
    let collapsed = replaced
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    collapsed.trim_matches('/').to_string()
}
