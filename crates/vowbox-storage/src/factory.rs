#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use vowbox_core::Config;

/// Create the storage backend described by configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    if config.storage.bucket.trim().is_empty() {
        return Err(StorageError::ConfigError(
            "S3_BUCKET not configured".to_string(),
        ));
    }

    #[cfg(feature = "storage-s3")]
    {
        let storage = S3Storage::new(&config.storage)?;
        tracing::info!(
            bucket = %config.storage.bucket,
            region = %config.storage.region,
            endpoint = ?config.storage.endpoint_url(),
            "S3 storage initialized"
        );
        Ok(Arc::new(storage))
    }

    #[cfg(not(feature = "storage-s3"))]
    {
        Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        ))
    }
}
