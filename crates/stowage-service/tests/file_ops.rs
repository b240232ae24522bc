//! File record scenarios: upload, listing aggregates, metadata-only
//! moves, access checks, presign clamping, and delete paths.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use stowage_core::error::{AppError, ErrorKind};
use stowage_core::result::AppResult;
use stowage_core::traits::ObjectStore;
use stowage_database::memory::MemoryFileStore;
use stowage_database::repositories::FileStore;
use stowage_entity::file::{CreateFileRecord, FileListing, FileQuery, FileRecord, FileSortField};
use stowage_entity::share::SharePermission;
use stowage_service::FileService;
use stowage_service::file::service::{DeleteOutcome, UpdateMetadataRequest, UploadRequest};
use stowage_service::folder::service::CreateFolderRequest;

use common::{CONTAINER, TestEnv, ctx};

#[tokio::test]
async fn test_upload_creates_object_and_record() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"hello world").await;

    assert_eq!(file.original_name, "notes.txt");
    assert_eq!(file.file_size, 11);
    assert!(file.file_name.ends_with(".txt"));
    assert_eq!(
        file.object_key,
        format!("{}/{}", owner.user_id, file.file_name)
    );

    let meta = env
        .objects
        .head(CONTAINER, &file.object_key)
        .await
        .unwrap()
        .expect("object should exist");
    assert_eq!(meta.size, 11);
}

#[tokio::test]
async fn test_upload_into_missing_folder_fails() {
    let env = TestEnv::new();
    let owner = ctx();

    let err = env
        .file_service
        .upload(
            &owner,
            UploadRequest {
                folder_id: Some(Uuid::new_v4()),
                original_name: "notes.txt".to_string(),
                mime_type: "text/plain".to_string(),
                data: Bytes::from_static(b"x"),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_list_files_clamps_and_aggregates() {
    let env = TestEnv::new();
    let owner = ctx();

    env.upload(&owner, None, "a.txt", b"aaaaaaaaaa").await; // 10
    env.upload(&owner, None, "b.txt", b"bbbbbbbbbbbbbbbbbbbb").await; // 20
    env.upload(&owner, None, "c.txt", b"cccccccccccccccccccccccccccccc").await; // 30

    let listing: FileListing = env
        .file_service
        .list_files(
            &owner,
            FileQuery {
                limit: 2,
                sort_by: FileSortField::FileSize,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(listing.files.len(), 2);
    assert_eq!(listing.total_count, 3);
    assert_eq!(listing.total_bytes, 60);
    assert_eq!(listing.files[0].file_size, 10);

    // A zero limit clamps up to one item rather than failing.
    let clamped = env
        .file_service
        .list_files(
            &owner,
            FileQuery {
                limit: 0,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(clamped.files.len(), 1);
}

#[tokio::test]
async fn test_list_files_mime_filter() {
    let env = TestEnv::new();
    let owner = ctx();

    env.upload(&owner, None, "a.txt", b"text").await;
    env.file_service
        .upload(
            &owner,
            UploadRequest {
                folder_id: None,
                original_name: "pic.png".to_string(),
                mime_type: "image/png".to_string(),
                data: Bytes::from_static(b"png"),
            },
        )
        .await
        .unwrap();

    let images = env
        .file_service
        .list_files(
            &owner,
            FileQuery {
                mime_type_pattern: Some("image/*".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(images.total_count, 1);
    assert_eq!(images.files[0].mime_type, "image/png");
}

#[tokio::test]
async fn test_move_is_metadata_only() {
    let env = TestEnv::new();
    let owner = ctx();

    let folder = env
        .folder_service
        .create_folder(
            &owner,
            CreateFolderRequest {
                parent_id: None,
                name: "Docs".to_string(),
            },
        )
        .await
        .unwrap();
    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    let moved = env
        .file_service
        .move_file(&owner, file.id, Some(folder.id))
        .await
        .unwrap();

    assert_eq!(moved.folder_id, Some(folder.id));
    // The object key never changes on a move.
    assert_eq!(moved.object_key, file.object_key);
    assert!(
        env.objects
            .head(CONTAINER, &file.object_key)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_move_to_missing_destination_fails() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    let err = env
        .file_service
        .move_file(&owner, file.id, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(err.message.contains("Destination folder"));
}

#[tokio::test]
async fn test_can_access_owner_and_direct_grants() {
    let env = TestEnv::new();
    let owner = ctx();
    let friend = Uuid::new_v4();
    let stranger = Uuid::new_v4();

    let mut file = env.upload(&owner, None, "notes.txt", b"x").await;
    file.shared_with = vec![friend];
    env.files.insert_raw(file.clone()).await;

    assert!(
        env.file_service
            .can_access(owner.user_id, file.id, SharePermission::View)
            .await
            .unwrap()
    );
    assert!(
        env.file_service
            .can_access(friend, file.id, SharePermission::Download)
            .await
            .unwrap()
    );
    assert!(
        !env.file_service
            .can_access(stranger, file.id, SharePermission::View)
            .await
            .unwrap()
    );
    assert!(
        !env.file_service
            .can_access(owner.user_id, Uuid::new_v4(), SharePermission::View)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_presigned_download_clamps_expiration() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    let short = env
        .file_service
        .issue_presigned_download(file.id, owner.user_id, 10)
        .await
        .unwrap();
    assert_eq!(short.expires_in, 300);
    assert!(short.url.contains("expires=300"));

    let long = env
        .file_service
        .issue_presigned_download(file.id, owner.user_id, 1_000_000)
        .await
        .unwrap();
    assert_eq!(long.expires_in, 86_400);
}

#[tokio::test]
async fn test_presigned_download_denial_is_distinct_from_missing_object() {
    let env = TestEnv::new();
    let owner = ctx();
    let stranger = Uuid::new_v4();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    let denied = env
        .file_service
        .issue_presigned_download(file.id, stranger, 600)
        .await
        .unwrap_err();
    assert_eq!(denied.kind, ErrorKind::AccessDenied);

    // A record pointing at a vanished object is a storage failure, not a
    // denial.
    env.objects.delete(CONTAINER, &file.object_key).await.unwrap();
    let missing = env
        .file_service
        .issue_presigned_download(file.id, owner.user_id, 600)
        .await
        .unwrap_err();
    assert_eq!(missing.kind, ErrorKind::Storage);
}

#[tokio::test]
async fn test_update_metadata_normalizes_tags() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    let updated = env
        .file_service
        .update_metadata(
            &owner,
            file.id,
            UpdateMetadataRequest {
                tags: Some(vec![
                    " project ".to_string(),
                    "".to_string(),
                    "project".to_string(),
                    "q3".to_string(),
                ]),
                metadata: Some(serde_json::json!({ "reviewed": true })),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.tags, vec!["project", "q3"]);
    assert_eq!(updated.metadata["reviewed"], serde_json::json!(true));
}

#[tokio::test]
async fn test_update_metadata_rejects_non_objects() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    let err = env
        .file_service
        .update_metadata(
            &owner,
            file.id,
            UpdateMetadataRequest {
                tags: None,
                metadata: Some(serde_json::json!(["not", "a", "map"])),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_soft_delete_hides_file() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    env.file_service.delete_file(&owner, file.id).await.unwrap();

    let listing = env
        .file_service
        .list_files(&owner, FileQuery::default())
        .await
        .unwrap();
    assert_eq!(listing.total_count, 0);

    // The object is untouched by a soft delete.
    assert!(
        env.objects
            .head(CONTAINER, &file.object_key)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_permanent_delete_removes_object_and_record() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    let outcome = env
        .file_service
        .permanent_delete(&owner, file.id)
        .await
        .unwrap();
    assert_eq!(outcome, DeleteOutcome::Permanent);

    assert!(env.files.find_by_id(file.id).await.unwrap().is_none());
    assert!(
        env.objects
            .head(CONTAINER, &file.object_key)
            .await
            .unwrap()
            .is_none()
    );
}

/// File store whose hard delete always fails, for exercising the
/// soft-delete fallback.
#[derive(Debug)]
struct DeleteFailingStore {
    inner: Arc<MemoryFileStore>,
}

#[async_trait]
impl FileStore for DeleteFailingStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<FileRecord>> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, data: &CreateFileRecord) -> AppResult<FileRecord> {
        self.inner.create(data).await
    }

    async fn list(&self, owner_id: Uuid, query: &FileQuery) -> AppResult<FileListing> {
        self.inner.list(owner_id, query).await
    }

    async fn list_by_folder(
        &self,
        owner_id: Uuid,
        folder_id: Option<Uuid>,
        limit: i64,
    ) -> AppResult<Vec<FileRecord>> {
        self.inner.list_by_folder(owner_id, folder_id, limit).await
    }

    async fn set_folder(&self, id: Uuid, folder_id: Option<Uuid>) -> AppResult<FileRecord> {
        self.inner.set_folder(id, folder_id).await
    }

    async fn update_annotations(
        &self,
        id: Uuid,
        tags: Option<&[String]>,
        metadata: Option<&serde_json::Value>,
    ) -> AppResult<FileRecord> {
        self.inner.update_annotations(id, tags, metadata).await
    }

    async fn mark_deleted(&self, id: Uuid) -> AppResult<bool> {
        self.inner.mark_deleted(id).await
    }

    async fn delete(&self, _id: Uuid) -> AppResult<bool> {
        Err(AppError::database("simulated delete failure"))
    }
}

#[tokio::test]
async fn test_permanent_delete_falls_back_to_soft_delete() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    let failing = FileService::new(
        Arc::new(DeleteFailingStore {
            inner: env.files.clone(),
        }),
        env.folders.clone(),
        env.objects.clone(),
        CONTAINER,
    );

    let outcome = failing.permanent_delete(&owner, file.id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::SoftDeleteFallback);

    // The object is gone, and the record survives only as a tombstone.
    assert!(
        env.objects
            .head(CONTAINER, &file.object_key)
            .await
            .unwrap()
            .is_none()
    );
    let tombstone = env.files.find_by_id(file.id).await.unwrap().unwrap();
    assert!(tombstone.is_deleted);
}

#[tokio::test]
async fn test_last_modified_advances_on_move() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    let before = Utc::now();
    let moved = env
        .file_service
        .move_file(&owner, file.id, None)
        .await
        .unwrap();
    assert!(moved.last_modified >= before || moved.last_modified >= file.last_modified);
}
