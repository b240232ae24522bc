//! In-memory object store.
//!
//! Backs service tests and embedded use. Prefix listings are served from
//! a sorted key map so pagination behaves like the S3 provider, and
//! presigned URLs are synthetic `memory://` URLs carrying the expiry so
//! callers can still observe TTL clamping.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use stowage_core::error::AppError;
use stowage_core::result::AppResult;
use stowage_core::traits::object_store::{
    ByteStream, ListPrefixRequest, ObjectMeta, ObjectPage, ObjectStore,
};

/// One stored object.
#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

/// In-memory object store keyed by container, then key.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    containers: RwLock<HashMap<String, BTreeMap<String, StoredObject>>>,
}

impl MemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count objects under a prefix. Test helper.
    pub async fn count_prefix(&self, container: &str, prefix: &str) -> usize {
        let containers = self.containers.read().await;
        containers
            .get(container)
            .map(|objects| {
                objects
                    .range(prefix.to_string()..)
                    .take_while(|(key, _)| key.starts_with(prefix))
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<()> {
        let mut containers = self.containers.write().await;
        containers.entry(container.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> AppResult<ByteStream> {
        let containers = self.containers.read().await;
        let object = containers
            .get(container)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| AppError::not_found(format!("Object not found: {key}")))?;

        let data = object.data.clone();
        Ok(Box::pin(futures::stream::once(async move { Ok(data) })))
    }

    async fn head(&self, container: &str, key: &str) -> AppResult<Option<ObjectMeta>> {
        let containers = self.containers.read().await;
        Ok(containers
            .get(container)
            .and_then(|objects| objects.get(key))
            .map(|object| ObjectMeta {
                key: key.to_string(),
                size: object.data.len() as u64,
                content_type: Some(object.content_type.clone()),
                last_modified: Some(object.last_modified),
            }))
    }

    async fn delete(&self, container: &str, key: &str) -> AppResult<()> {
        let mut containers = self.containers.write().await;
        if let Some(objects) = containers.get_mut(container) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn copy(&self, container: &str, from: &str, to: &str) -> AppResult<()> {
        let mut containers = self.containers.write().await;
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| AppError::not_found(format!("Object not found: {from}")))?;
        let source = objects
            .get(from)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Object not found: {from}")))?;
        objects.insert(to.to_string(), source);
        Ok(())
    }

    async fn list_prefix(
        &self,
        container: &str,
        req: &ListPrefixRequest,
    ) -> AppResult<ObjectPage> {
        let containers = self.containers.read().await;
        let Some(objects) = containers.get(container) else {
            return Ok(ObjectPage::default());
        };

        let start = req
            .continuation
            .clone()
            .unwrap_or_else(|| req.prefix.clone());
        let max_keys = req.max_keys.max(0) as usize;

        let mut page = ObjectPage::default();
        let mut child_prefixes: Vec<String> = Vec::new();

        for (key, object) in objects
            .range(start..)
            .filter(|(key, _)| req.continuation.as_deref() != Some(key.as_str()))
            .take_while(|(key, _)| key.starts_with(&req.prefix))
        {
            if page.objects.len() + child_prefixes.len() >= max_keys {
                page.truncated = true;
                page.next_continuation = page
                    .objects
                    .last()
                    .map(|meta| meta.key.clone())
                    .or_else(|| Some(key.clone()));
                break;
            }

            if !req.recursive {
                // Group keys below the next '/' into a child prefix.
                if let Some(slash) = key[req.prefix.len()..].find('/') {
                    let child = key[..req.prefix.len() + slash + 1].to_string();
                    if child != req.prefix && child_prefixes.last() != Some(&child) {
                        child_prefixes.push(child);
                    }
                    continue;
                }
            }

            page.objects.push(ObjectMeta {
                key: key.clone(),
                size: object.data.len() as u64,
                content_type: Some(object.content_type.clone()),
                last_modified: Some(object.last_modified),
            });
        }

        page.child_prefixes = child_prefixes;
        Ok(page)
    }

    async fn presign_get(&self, container: &str, key: &str, ttl: Duration) -> AppResult<String> {
        let containers = self.containers.read().await;
        if containers
            .get(container)
            .and_then(|objects| objects.get(key))
            .is_none()
        {
            return Err(AppError::not_found(format!("Object not found: {key}")));
        }
        Ok(format!(
            "memory://{container}/{key}?method=GET&expires={}",
            ttl.as_secs()
        ))
    }

    async fn presign_put(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
        _content_type: Option<&str>,
    ) -> AppResult<String> {
        Ok(format!(
            "memory://{container}/{key}?method=PUT&expires={}",
            ttl.as_secs()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    const BUCKET: &str = "test-bucket";

    fn store() -> MemoryObjectStore {
        MemoryObjectStore::new()
    }

    #[tokio::test]
    async fn test_put_head_roundtrip() {
        let store = store();
        store
            .put(BUCKET, "a/b.txt", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();

        let meta = store.head(BUCKET, "a/b.txt").await.unwrap().unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta.content_type.as_deref(), Some("text/plain"));
        assert!(store.head(BUCKET, "a/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_streams_data() {
        let store = store();
        store
            .put(BUCKET, "k", Bytes::from_static(b"data"), "text/plain")
            .await
            .unwrap();

        let mut stream = store.get(BUCKET, "k").await.unwrap();
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"data");
    }

    #[tokio::test]
    async fn test_recursive_listing() {
        let store = store();
        for key in ["p/a", "p/b", "p/sub/c", "q/d"] {
            store
                .put(BUCKET, key, Bytes::new(), "application/octet-stream")
                .await
                .unwrap();
        }

        let page = store
            .list_prefix(BUCKET, &ListPrefixRequest::recursive("p/", 100))
            .await
            .unwrap();
        let keys: Vec<_> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["p/a", "p/b", "p/sub/c"]);
        assert!(!page.truncated);
    }

    #[tokio::test]
    async fn test_non_recursive_listing_reports_child_prefixes() {
        let store = store();
        for key in ["p/a", "p/sub/c", "p/sub/d", "p/zub/e"] {
            store
                .put(BUCKET, key, Bytes::new(), "application/octet-stream")
                .await
                .unwrap();
        }

        let page = store
            .list_prefix(
                BUCKET,
                &ListPrefixRequest {
                    prefix: "p/".to_string(),
                    recursive: false,
                    max_keys: 100,
                    continuation: None,
                },
            )
            .await
            .unwrap();

        let keys: Vec<_> = page.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["p/a"]);
        assert_eq!(page.child_prefixes, vec!["p/sub/", "p/zub/"]);
    }

    #[tokio::test]
    async fn test_copy_then_delete_moves_object() {
        let store = store();
        store
            .put(BUCKET, "old/x", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();

        store.copy(BUCKET, "old/x", "new/x").await.unwrap();
        store.delete(BUCKET, "old/x").await.unwrap();

        assert!(store.head(BUCKET, "old/x").await.unwrap().is_none());
        assert!(store.head(BUCKET, "new/x").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_presign_get_requires_object() {
        let store = store();
        let err = store
            .presign_get(BUCKET, "nope", Duration::from_secs(300))
            .await
            .unwrap_err();
        assert_eq!(err.kind, stowage_core::error::ErrorKind::NotFound);

        store
            .put(BUCKET, "yes", Bytes::new(), "text/plain")
            .await
            .unwrap();
        let url = store
            .presign_get(BUCKET, "yes", Duration::from_secs(300))
            .await
            .unwrap();
        assert!(url.contains("expires=300"));
    }
}
