//! S3-compatible object storage provider.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream as S3ByteStream;
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::debug;

use stowage_core::config::object_store::ObjectStoreConfig;
use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::traits::object_store::{
    ByteStream, ListPrefixRequest, ObjectMeta, ObjectPage, ObjectStore,
};

/// S3-compatible object store.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    /// Create a new S3 object store from configuration.
    pub fn new(config: &ObjectStoreConfig) -> AppResult<Self> {
        use aws_config::Region;

        if config.bucket.is_empty() {
            return Err(AppError::configuration("object_store.bucket is not set"));
        }

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "stowage",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(config.force_path_style);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = aws_sdk_s3::Client::from_conf(builder.build());

        tracing::info!(
            region = %config.region,
            bucket = %config.bucket,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "Initialized S3 object store"
        );

        Ok(Self { client })
    }

    /// Encode a key for use in an S3 `CopySource` header. Slashes stay
    /// as path separators.
    fn copy_source(container: &str, key: &str) -> String {
        let encoded = urlencoding::encode(key).replace("%2F", "/");
        format!("{container}/{encoded}")
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(container)
            .key(key)
            .body(S3ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, format!("S3 put failed for {key}"), e)
            })?;

        debug!(key, bytes = size, "Wrote object");
        Ok(())
    }

    async fn get(&self, container: &str, key: &str) -> AppResult<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(container)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    AppError::not_found(format!("Object not found: {key}"))
                } else {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("S3 get failed for {key}"),
                        service_err,
                    )
                }
            })?;

        let reader = output.body.into_async_read();
        Ok(Box::pin(ReaderStream::new(reader)))
    }

    async fn head(&self, container: &str, key: &str) -> AppResult<Option<ObjectMeta>> {
        match self
            .client
            .head_object()
            .bucket(container)
            .key(key)
            .send()
            .await
        {
            Ok(output) => Ok(Some(ObjectMeta {
                key: key.to_string(),
                size: output.content_length().unwrap_or(0).max(0) as u64,
                content_type: output.content_type().map(str::to_string),
                last_modified: output.last_modified().and_then(to_chrono),
            })),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(None)
                } else {
                    Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("S3 head failed for {key}"),
                        service_err,
                    ))
                }
            }
        }
    }

    async fn delete(&self, container: &str, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(container)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, format!("S3 delete failed for {key}"), e)
            })?;
        Ok(())
    }

    async fn copy(&self, container: &str, from: &str, to: &str) -> AppResult<()> {
        self.client
            .copy_object()
            .bucket(container)
            .copy_source(Self::copy_source(container, from))
            .key(to)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("S3 copy failed: {from} -> {to}"),
                    e,
                )
            })?;
        Ok(())
    }

    async fn list_prefix(
        &self,
        container: &str,
        req: &ListPrefixRequest,
    ) -> AppResult<ObjectPage> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(container)
            .prefix(&req.prefix)
            .max_keys(req.max_keys);

        if !req.recursive {
            request = request.delimiter("/");
        }
        if let Some(token) = &req.continuation {
            request = request.continuation_token(token);
        }

        let output = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("S3 list failed for prefix {}", req.prefix),
                e,
            )
        })?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|obj| {
                obj.key().map(|key| ObjectMeta {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    content_type: None,
                    last_modified: obj.last_modified().and_then(to_chrono),
                })
            })
            .collect();

        let child_prefixes = output
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        Ok(ObjectPage {
            objects,
            child_prefixes,
            next_continuation: output.next_continuation_token().map(str::to_string),
            truncated: output.is_truncated().unwrap_or(false),
        })
    }

    async fn presign_get(&self, container: &str, key: &str, ttl: Duration) -> AppResult<String> {
        let presign_config = PresigningConfig::expires_in(ttl).map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Invalid presign expiration", e)
        })?;

        let presigned = self
            .client
            .get_object()
            .bucket(container)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("S3 presign GET failed for {key}"),
                    e,
                )
            })?;

        Ok(presigned.uri().to_string())
    }

    async fn presign_put(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
        content_type: Option<&str>,
    ) -> AppResult<String> {
        let presign_config = PresigningConfig::expires_in(ttl).map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Invalid presign expiration", e)
        })?;

        let mut request = self.client.put_object().bucket(container).key(key);
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        let presigned = request.presigned(presign_config).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("S3 presign PUT failed for {key}"),
                e,
            )
        })?;

        Ok(presigned.uri().to_string())
    }
}

/// Convert an SDK timestamp to `chrono`.
fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}
