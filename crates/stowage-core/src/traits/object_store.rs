//! Object store capability trait.
//!
//! The trait is defined here in `stowage-core` and implemented in
//! `stowage-storage` (S3 and an in-memory double). Services receive an
//! `Arc<dyn ObjectStore>` at construction time; nothing in the core ever
//! talks to an SDK directly.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::result::AppResult;

/// Metadata about a stored object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ObjectMeta {
    /// Full key within the container.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Content type (if known).
    pub content_type: Option<String>,
    /// Last modified timestamp.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Parameters for a prefix listing.
#[derive(Debug, Clone)]
pub struct ListPrefixRequest {
    /// Key prefix to list under.
    pub prefix: String,
    /// When false, stop at the next `/` and report child prefixes instead
    /// of descending into them.
    pub recursive: bool,
    /// Maximum keys per page.
    pub max_keys: i32,
    /// Continuation token from a previous truncated page.
    pub continuation: Option<String>,
}

impl ListPrefixRequest {
    /// Create a recursive listing request for a prefix.
    pub fn recursive(prefix: impl Into<String>, max_keys: i32) -> Self {
        Self {
            prefix: prefix.into(),
            recursive: true,
            max_keys,
            continuation: None,
        }
    }
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    /// Objects whose keys start with the requested prefix.
    pub objects: Vec<ObjectMeta>,
    /// Immediate child prefixes (only populated for non-recursive listings).
    pub child_prefixes: Vec<String>,
    /// Continuation token when the listing is truncated.
    pub next_continuation: Option<String>,
    /// Whether more keys remain beyond this page.
    pub truncated: bool,
}

/// A byte stream type used for reading object contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for object store backends.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Write an object.
    async fn put(&self, container: &str, key: &str, data: Bytes, content_type: &str)
    -> AppResult<()>;

    /// Read an object as a byte stream.
    async fn get(&self, container: &str, key: &str) -> AppResult<ByteStream>;

    /// Fetch object metadata, or `None` when the key does not exist.
    async fn head(&self, container: &str, key: &str) -> AppResult<Option<ObjectMeta>>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, container: &str, key: &str) -> AppResult<()>;

    /// Copy an object to a new key within the same container.
    async fn copy(&self, container: &str, from: &str, to: &str) -> AppResult<()>;

    /// List one page of objects under a key prefix.
    async fn list_prefix(&self, container: &str, req: &ListPrefixRequest)
    -> AppResult<ObjectPage>;

    /// Produce a time-bounded presigned GET URL for an object.
    async fn presign_get(&self, container: &str, key: &str, ttl: Duration) -> AppResult<String>;

    /// Produce a time-bounded presigned PUT URL for an object.
    async fn presign_put(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
        content_type: Option<&str>,
    ) -> AppResult<String>;
}
