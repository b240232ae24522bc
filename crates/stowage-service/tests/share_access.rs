//! Share lifecycle and anonymous access scenarios: ownership collapse,
//! token resolution, allowlists, per-action permission bits, folder
//! downloads, and revocation idempotence.

mod common;

use chrono::{Duration, Utc};
use uuid::Uuid;

use stowage_core::error::ErrorKind;
use stowage_database::repositories::ShareStore;
use stowage_entity::file::FileRecord;
use stowage_entity::share::{CreateShareGrant, SharePermission, SharedItemType};
use stowage_service::folder::service::CreateFolderRequest;
use stowage_service::share::access::{ShareDownload, ShareDownloadRequest, SharedItem};
use stowage_service::share::service::{CreateShareRequest, UpdateShareRequest};

use common::{TestEnv, ctx};

fn share_file(
    item_id: Uuid,
    permissions: Vec<SharePermission>,
) -> CreateShareRequest {
    CreateShareRequest {
        item_type: SharedItemType::File,
        item_id,
        permissions,
        expires_at: None,
        allowed_emails: Vec::new(),
    }
}

#[tokio::test]
async fn test_create_share_requires_ownership() {
    let env = TestEnv::new();
    let owner = ctx();
    let stranger = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    // Someone else's file and a nonexistent file produce the same denial.
    let not_owned = env
        .share_service
        .create_share(&stranger, share_file(file.id, vec![]))
        .await
        .unwrap_err();
    let missing = env
        .share_service
        .create_share(&owner, share_file(Uuid::new_v4(), vec![]))
        .await
        .unwrap_err();

    assert_eq!(not_owned.kind, ErrorKind::AccessDenied);
    assert_eq!(missing.kind, ErrorKind::AccessDenied);
    assert_eq!(not_owned.message, missing.message);
}

#[tokio::test]
async fn test_create_share_normalizes_permissions_and_builds_url() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    let created = env
        .share_service
        .create_share(&owner, share_file(file.id, vec![]))
        .await
        .unwrap();

    assert_eq!(created.grant.permissions, vec![SharePermission::View]);
    assert_eq!(
        created.access_url,
        format!("{}/s/{}", common::BASE_URL, created.grant.token)
    );
    assert_eq!(created.grant.token.len(), 43);
}

#[tokio::test]
async fn test_share_expiry_must_be_in_the_future() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    let err = env
        .share_service
        .create_share(
            &owner,
            CreateShareRequest {
                expires_at: Some(Utc::now() - Duration::seconds(5)),
                ..share_file(file.id, vec![])
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_dead_tokens_are_indistinguishable() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    // Expired: seeded directly, the service refuses to create one.
    let expired = env
        .shares
        .create(&CreateShareGrant {
            owner_id: owner.user_id,
            item_type: SharedItemType::File,
            item_id: file.id,
            token: "expired-token".to_string(),
            permissions: vec![SharePermission::View],
            allowed_emails: Vec::new(),
            expires_at: Some(Utc::now() - Duration::hours(1)),
        })
        .await
        .unwrap();

    // Revoked.
    let revoked = env
        .share_service
        .create_share(&owner, share_file(file.id, vec![]))
        .await
        .unwrap();
    assert!(
        env.share_service
            .revoke_share(&owner, revoked.grant.id)
            .await
            .unwrap()
    );

    // Item vanished.
    let orphaned = env
        .share_service
        .create_share(&owner, share_file(file.id, vec![]))
        .await
        .unwrap();
    env.file_service
        .permanent_delete(&owner, file.id)
        .await
        .unwrap();

    let unknown_err = env.share_access.resolve_token("no-such-token").await.unwrap_err();
    let expired_err = env.share_access.resolve_token(&expired.token).await.unwrap_err();
    let revoked_err = env
        .share_access
        .resolve_token(&revoked.grant.token)
        .await
        .unwrap_err();
    let orphaned_err = env
        .share_access
        .resolve_token(&orphaned.grant.token)
        .await
        .unwrap_err();

    for err in [&unknown_err, &expired_err, &revoked_err, &orphaned_err] {
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, unknown_err.message);
    }
}

#[tokio::test]
async fn test_allowlist_denial_is_distinct_from_not_found() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    let created = env
        .share_service
        .create_share(
            &owner,
            CreateShareRequest {
                permissions: vec![SharePermission::View, SharePermission::Download],
                allowed_emails: vec!["Alice@Example.com".to_string()],
                ..share_file(file.id, vec![])
            },
        )
        .await
        .unwrap();
    let token = &created.grant.token;

    // Missing and mismatched emails are recipient failures for both view
    // and download, never a silent grant and never a not-found.
    let no_email = env.share_access.view_via_token(token, None).await.unwrap_err();
    assert_eq!(no_email.kind, ErrorKind::UnauthorizedRecipient);

    let wrong = env
        .share_access
        .download_via_token(token, Some("mallory@example.com"), ShareDownloadRequest::default())
        .await
        .unwrap_err();
    assert_eq!(wrong.kind, ErrorKind::UnauthorizedRecipient);

    // Matching is case-insensitive.
    let resolved = env
        .share_access
        .view_via_token(token, Some("  alice@example.COM "))
        .await
        .unwrap();
    assert!(matches!(resolved.item, SharedItem::File(_)));
}

#[tokio::test]
async fn test_each_action_checks_its_own_permission() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;

    let view_only = env
        .share_service
        .create_share(&owner, share_file(file.id, vec![SharePermission::View]))
        .await
        .unwrap();
    let download_only = env
        .share_service
        .create_share(&owner, share_file(file.id, vec![SharePermission::Download]))
        .await
        .unwrap();

    // {view} never allows download.
    env.share_access
        .view_via_token(&view_only.grant.token, None)
        .await
        .unwrap();
    let err = env
        .share_access
        .download_via_token(&view_only.grant.token, None, ShareDownloadRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessDenied);

    // {download} alone never allows view.
    env.share_access
        .download_via_token(
            &download_only.grant.token,
            None,
            ShareDownloadRequest::default(),
        )
        .await
        .unwrap();
    let err = env
        .share_access
        .view_via_token(&download_only.grant.token, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessDenied);
}

#[tokio::test]
async fn test_file_share_download_scenario() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    let created = env
        .share_service
        .create_share(
            &owner,
            CreateShareRequest {
                permissions: vec![SharePermission::View, SharePermission::Download],
                expires_at: Some(Utc::now() + Duration::hours(1)),
                ..share_file(file.id, vec![])
            },
        )
        .await
        .unwrap();
    let token = created.grant.token.clone();

    let download = env
        .share_access
        .download_via_token(&token, None, ShareDownloadRequest::default())
        .await
        .unwrap();
    match download {
        ShareDownload::File(presigned) => {
            assert!((300..=86_400).contains(&presigned.expires_in));
            assert!(presigned.url.contains(&file.object_key));
        }
        ShareDownload::Folder(_) => panic!("expected a file download"),
    }

    // Revocation: first call changes state, the second reports no change,
    // and the token is dead either way.
    assert!(
        env.share_service
            .revoke_share(&owner, created.grant.id)
            .await
            .unwrap()
    );
    assert!(
        !env.share_service
            .revoke_share(&owner, created.grant.id)
            .await
            .unwrap()
    );

    let err = env
        .share_access
        .download_via_token(&token, None, ShareDownloadRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_folder_share_download_walks_subtree() {
    let env = TestEnv::new();
    let owner = ctx();

    let docs = env
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
    let nested = env
        .folder_service
        .create_folder(
            &owner,
            CreateFolderRequest {
                parent_id: Some(docs.id),
                name: "Archive".to_string(),
            },
        )
        .await
        .unwrap();

    env.upload(&owner, Some(docs.id), "top.txt", b"top").await;
    env.upload(&owner, Some(nested.id), "deep.txt", b"deep").await;

    let created = env
        .share_service
        .create_share(
            &owner,
            CreateShareRequest {
                item_type: SharedItemType::Folder,
                item_id: docs.id,
                permissions: vec![SharePermission::Download],
                expires_at: None,
                allowed_emails: Vec::new(),
            },
        )
        .await
        .unwrap();
    let token = &created.grant.token;

    let flat = env
        .share_access
        .download_via_token(
            token,
            None,
            ShareDownloadRequest {
                recursive: false,
                expiration_seconds: 600,
            },
        )
        .await
        .unwrap();
    match flat {
        ShareDownload::Folder(result) => {
            assert_eq!(result.files.len(), 1);
            assert_eq!(result.files[0].file_name, "top.txt");
        }
        ShareDownload::File(_) => panic!("expected a folder download"),
    }

    let recursive = env
        .share_access
        .download_via_token(
            token,
            None,
            ShareDownloadRequest {
                recursive: true,
                expiration_seconds: 600,
            },
        )
        .await
        .unwrap();
    match recursive {
        ShareDownload::Folder(result) => {
            assert_eq!(result.files.len(), 2);
            assert_eq!(result.skipped, 0);
            assert!(!result.truncated);
        }
        ShareDownload::File(_) => panic!("expected a folder download"),
    }
}

#[tokio::test]
async fn test_folder_share_download_skips_broken_files() {
    let env = TestEnv::new();
    let owner = ctx();

    let docs = env
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

    env.upload(&owner, Some(docs.id), "good.txt", b"ok").await;

    // A record whose object vanished: URL generation fails for it and it
    // is skipped, not fatal.
    let now = Utc::now();
    env.files
        .insert_raw(FileRecord {
            id: Uuid::new_v4(),
            owner_id: owner.user_id,
            folder_id: Some(docs.id),
            file_name: "broken.bin".to_string(),
            original_name: "broken.bin".to_string(),
            file_size: 1,
            mime_type: "application/octet-stream".to_string(),
            object_key: format!("{}/broken.bin", owner.user_id),
            object_container: common::CONTAINER.to_string(),
            uploaded_at: now,
            last_modified: now,
            is_deleted: false,
            tags: Vec::new(),
            metadata: serde_json::json!({}),
            shared_with: Vec::new(),
        })
        .await;

    let created = env
        .share_service
        .create_share(
            &owner,
            CreateShareRequest {
                item_type: SharedItemType::Folder,
                item_id: docs.id,
                permissions: vec![SharePermission::Download],
                expires_at: None,
                allowed_emails: Vec::new(),
            },
        )
        .await
        .unwrap();

    let download = env
        .share_access
        .download_via_token(&created.grant.token, None, ShareDownloadRequest::default())
        .await
        .unwrap();
    match download {
        ShareDownload::Folder(result) => {
            assert_eq!(result.files.len(), 1);
            assert_eq!(result.files[0].file_name, "good.txt");
            assert_eq!(result.skipped, 1);
        }
        ShareDownload::File(_) => panic!("expected a folder download"),
    }
}

#[tokio::test]
async fn test_update_share_replaces_permissions_and_allowlist() {
    let env = TestEnv::new();
    let owner = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    let created = env
        .share_service
        .create_share(
            &owner,
            share_file(file.id, vec![SharePermission::View, SharePermission::Download]),
        )
        .await
        .unwrap();

    let updated = env
        .share_service
        .update_share(
            &owner,
            created.grant.id,
            UpdateShareRequest {
                permissions: Some(vec![SharePermission::Download]),
                expires_at: None,
                allowed_emails: Some(vec![" Bob@Example.com ".to_string()]),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.permissions, vec![SharePermission::Download]);
    assert_eq!(updated.allowed_emails, vec!["bob@example.com"]);

    // View was removed by the update.
    let err = env
        .share_access
        .view_via_token(&created.grant.token, Some("bob@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessDenied);
}

#[tokio::test]
async fn test_owner_lookups_get_a_real_not_found() {
    let env = TestEnv::new();
    let owner = ctx();
    let stranger = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    let created = env
        .share_service
        .create_share(&owner, share_file(file.id, vec![]))
        .await
        .unwrap();

    // The owner asking for a grant that does not exist sees a plain
    // not-found, unlike the collapsed anonymous path.
    let err = env
        .share_service
        .get_share(&owner, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // Another user cannot see the grant at all.
    let err = env
        .share_service
        .get_share(&stranger, created.grant.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    // Updating a revoked grant is refused.
    env.share_service
        .revoke_share(&owner, created.grant.id)
        .await
        .unwrap();
    let err = env
        .share_service
        .update_share(
            &owner,
            created.grant.id,
            UpdateShareRequest {
                permissions: None,
                expires_at: None,
                allowed_emails: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn test_revoking_someone_elses_share_reports_no_change() {
    let env = TestEnv::new();
    let owner = ctx();
    let stranger = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    let created = env
        .share_service
        .create_share(&owner, share_file(file.id, vec![]))
        .await
        .unwrap();

    assert!(
        !env.share_service
            .revoke_share(&stranger, created.grant.id)
            .await
            .unwrap()
    );
    assert!(
        !env.share_service
            .revoke_share(&owner, Uuid::new_v4())
            .await
            .unwrap()
    );

    // The grant is still live.
    env.share_access
        .resolve_token(&created.grant.token)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_shares_pages_by_owner() {
    let env = TestEnv::new();
    let owner = ctx();
    let other = ctx();

    let file = env.upload(&owner, None, "notes.txt", b"x").await;
    for _ in 0..3 {
        env.share_service
            .create_share(&owner, share_file(file.id, vec![]))
            .await
            .unwrap();
    }

    let page = env
        .share_service
        .list_shares(&owner, stowage_core::types::ListRange::new(2, 0))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_items, 3);

    let empty = env
        .share_service
        .list_shares(&other, stowage_core::types::ListRange::default())
        .await
        .unwrap();
    assert_eq!(empty.total_items, 0);
}
