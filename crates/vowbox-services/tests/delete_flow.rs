mod helpers;

use helpers::{service, Op};
use std::collections::HashSet;
use std::time::Duration;
use vowbox_services::{client_safe_message, FileError, StorageError};

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn delete_file_removes_object() {
    let (service, storage, _) = service();
    storage.insert("org/a.pdf", b"pdf");

    service.delete_file("org/a.pdf").await.unwrap();

    assert!(storage.object("org/a.pdf").is_none());
    assert_eq!(storage.calls(Op::Delete), 1);
}

#[tokio::test]
async fn deleting_missing_key_succeeds_without_retry() {
    let (service, storage, sleeper) = service();

    service.delete_file("org/gone.pdf").await.unwrap();

    assert_eq!(storage.calls(Op::Delete), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn transient_delete_failure_is_retried() {
    let (service, storage, sleeper) = service();
    storage.insert("org/a.pdf", b"pdf");
    storage.fail_times(Op::Delete, 1, StorageError::DeleteFailed);

    service.delete_file("org/a.pdf").await.unwrap();

    assert_eq!(storage.calls(Op::Delete), 2);
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(100)]);
    assert!(storage.object("org/a.pdf").is_none());
}

#[tokio::test]
async fn delete_files_removes_everything() {
    let (service, storage, _) = service();
    for key in ["k1", "k2", "k3"] {
        storage.insert(key, b"x");
    }

    service.delete_files(&keys(&["k1", "k2", "k3"])).await.unwrap();

    assert_eq!(storage.object_count(), 0);
    assert_eq!(storage.calls(Op::Delete), 3);
}

#[tokio::test]
async fn delete_files_fails_fast_but_issues_every_delete() {
    let (service, storage, _) = service();
    for key in ["k1", "k2", "k3"] {
        storage.insert(key, b"x");
    }
    storage.fail_key(Op::Delete, "k2", StorageError::AccessDenied);

    let err = service
        .delete_files(&keys(&["k1", "k2", "k3"]))
        .await
        .unwrap_err();

    assert!(matches!(err, FileError::AccessDenied { .. }));
    assert_eq!(client_safe_message(&err), "Access denied");

    let mut deleted = storage.keys(Op::Delete);
    deleted.sort();
    assert_eq!(deleted, keys(&["k1", "k2", "k3"]));
}

#[tokio::test]
async fn delete_files_with_no_keys() {
    let (service, storage, _) = service();

    service.delete_files(&[]).await.unwrap();

    assert_eq!(storage.total_calls(), 0);
}

#[tokio::test]
async fn presigned_upload_url_is_single_call() {
    let (service, storage, _) = service();

    let url = service
        .generate_presigned_upload_url("org/direct.png", "image/png", Duration::from_secs(900))
        .await
        .unwrap();

    assert!(url.contains("org/direct.png"));
    assert!(url.contains("expires=900"));
    assert_eq!(storage.calls(Op::PresignPut), 1);
}

#[tokio::test]
async fn presigned_upload_url_failure_is_not_retried() {
    let (service, storage, sleeper) = service();
    storage.fail(Op::PresignPut, StorageError::PresignFailed);

    let err = service
        .generate_presigned_upload_url("org/direct.png", "image/png", Duration::from_secs(900))
        .await
        .unwrap_err();

    assert!(matches!(err, FileError::Storage { .. }));
    assert_eq!(client_safe_message(&err), "Upload failed. Please try again.");
    assert_eq!(storage.calls(Op::PresignPut), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn file_metadata_surfaces_not_found() {
    let (service, storage, _) = service();
    storage.insert("org/a.pdf", b"12345");

    let meta = service.file_metadata("org/a.pdf").await.unwrap();
    assert_eq!(meta.size, 5);

    let err = service.file_metadata("org/missing.pdf").await.unwrap_err();
    assert!(matches!(err, FileError::NotFound { .. }));
}

#[tokio::test]
async fn orphan_cleanup_is_a_no_op() {
    let (service, storage, _) = service();
    storage.insert("org/a.pdf", b"x");
    let valid: HashSet<String> = HashSet::new();

    service.cleanup_orphaned_files(&valid).await.unwrap();

    assert_eq!(storage.total_calls(), 0);
    assert!(storage.object("org/a.pdf").is_some());
}
