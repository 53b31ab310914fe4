//! Storage abstraction trait
//!
//! This module defines the Storage trait that every object-store backend implements.
//! Each operation is a single round-trip to the backend with no retry; retries are
//! layered on top by the service layer.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use vowbox_core::{FileError, ValidationKind};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for FileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => FileError::not_found(key),
            StorageError::AccessDenied(operation) => FileError::AccessDenied {
                operation: operation.clone(),
                source: Some(anyhow::Error::new(StorageError::AccessDenied(operation))),
            },
            StorageError::InvalidKey(message) => {
                FileError::validation(ValidationKind::Constraint, message)
            }
            other => FileError::storage_with_source(other.to_string(), anyhow::Error::new(other)),
        }
    }
}

/// Metadata of a stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub e_tag: Option<String>,
}

/// Storage abstraction trait
///
/// The service layer receives an `Arc<dyn Storage>` so that it can run against
/// an in-memory store in tests and against S3-compatible providers in production.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `key`, overwriting any existing object.
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        cache_control: Option<&str>,
    ) -> StorageResult<()>;

    /// Download an object. Returns `NotFound` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Fetch object metadata. Returns `NotFound` when the key is absent.
    async fn head(&self, key: &str) -> StorageResult<ObjectMetadata>;

    /// Delete an object by its storage key
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Generate a presigned GET URL valid for `expires_in`.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Generate a presigned PUT URL so clients can upload directly.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;
}
