//! Upload and delete orchestration
//!
//! An upload moves through [`UploadStage`]s: validate (no retry), optionally
//! transform, store the main asset, store the thumbnail, then resolve URLs.
//! Every network step and the transform are wrapped by the retry executor.
//! Batch uploads run one file at a time; batch deletes are dispatched all at once.

use bytes::Bytes;
use futures::future::try_join_all;
use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;
use vowbox_core::constants::DEFAULT_PRESIGNED_URL_TTL_SECS;
use vowbox_core::{
    normalize_mime_type, Config, ErrorMetadata, FileError, FileUploadOptions, FileUploadResult,
    LogLevel, UploadFile, ValidationResult,
};
use vowbox_processing::compression::WEBP_CONTENT_TYPE;
use vowbox_processing::{FileValidator, ImageTransformer, TransformedImage};
use vowbox_storage::keys::{generate_key, generate_key_with_extension, thumbnail_prefix};
use vowbox_storage::{ObjectMetadata, Storage, StorageError};

use crate::retry::{RetryExecutor, RetryPolicy, Sleeper};

/// Keys are never reused, so stored objects can be cached forever.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

const WEBP_EXTENSION: &str = "webp";

/// States of a single upload call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Validating,
    Transforming,
    UploadingMain,
    UploadingThumbnail,
    ResolvingUrls,
    Done,
    Failed,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::Validating => "validating",
            UploadStage::Transforming => "transforming",
            UploadStage::UploadingMain => "uploading_main",
            UploadStage::UploadingThumbnail => "uploading_thumbnail",
            UploadStage::ResolvingUrls => "resolving_urls",
            UploadStage::Done => "done",
            UploadStage::Failed => "failed",
        }
    }
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct FileServiceConfig {
    pub retry: RetryPolicy,
    /// When set, URLs are `{public_base_url}/{key}` instead of presigned.
    pub public_base_url: Option<String>,
    pub presigned_url_ttl: Duration,
}

impl Default for FileServiceConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            public_base_url: None,
            presigned_url_ttl: Duration::from_secs(DEFAULT_PRESIGNED_URL_TTL_SECS),
        }
    }
}

impl From<&Config> for FileServiceConfig {
    fn from(config: &Config) -> Self {
        Self {
            retry: RetryPolicy::from(&config.retry),
            public_base_url: config.public_url().map(String::from),
            presigned_url_ttl: Duration::from_secs(config.uploads.presigned_url_ttl_secs),
        }
    }
}

/// Bytes about to be stored for one upload
struct PreparedUpload {
    key: String,
    data: Bytes,
    content_type: String,
    thumbnail: Option<(String, Bytes)>,
}

#[derive(Clone)]
pub struct FileService {
    storage: Arc<dyn Storage>,
    retry: RetryExecutor,
    public_base_url: Option<String>,
    presigned_url_ttl: Duration,
}

impl FileService {
    pub fn new(storage: Arc<dyn Storage>, config: FileServiceConfig) -> Self {
        Self {
            storage,
            retry: RetryExecutor::new(config.retry),
            public_base_url: config.public_base_url,
            presigned_url_ttl: config.presigned_url_ttl,
        }
    }

    /// Like [`FileService::new`] with a custom backoff sleeper.
    pub fn with_sleeper(
        storage: Arc<dyn Storage>,
        config: FileServiceConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            storage,
            retry: RetryExecutor::with_sleeper(config.retry, sleeper),
            public_base_url: config.public_base_url,
            presigned_url_ttl: config.presigned_url_ttl,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn validate_file(&self, file: &UploadFile, options: &FileUploadOptions) -> ValidationResult {
        FileValidator::validate(file, options)
    }

    /// Upload one file, and its thumbnail when requested for an image.
    ///
    /// Either both objects are stored or the call fails; a result never lacks the
    /// thumbnail that was asked for.
    pub async fn upload_file(
        &self,
        file: &UploadFile,
        options: &FileUploadOptions,
    ) -> Result<FileUploadResult, FileError> {
        let mut stage = UploadStage::Validating;

        match self.run_upload(file, options, &mut stage).await {
            Ok(result) => Ok(result),
            Err(err) => {
                let failed_at = stage;
                advance(&mut stage, UploadStage::Failed, &file.name);
                log_upload_failure(&err, failed_at, &file.name);
                Err(err)
            }
        }
    }

    async fn run_upload(
        &self,
        file: &UploadFile,
        options: &FileUploadOptions,
        stage: &mut UploadStage,
    ) -> Result<FileUploadResult, FileError> {
        tracing::debug!(
            file_name = %file.name,
            content_type = %file.mime_type,
            size_bytes = file.size(),
            stage = %stage,
            "Starting upload"
        );
        FileValidator::check(file, options)?;

        let folder = options.folder.as_deref();
        let prepared = if options.generate_thumbnail && file.is_image() {
            advance(stage, UploadStage::Transforming, &file.name);
            let transformed = self.transform(file, options).await?;
            PreparedUpload {
                key: generate_key_with_extension(&file.name, folder, WEBP_EXTENSION),
                data: transformed.optimized,
                content_type: WEBP_CONTENT_TYPE.to_string(),
                thumbnail: transformed.thumbnail.map(|thumb| {
                    let prefix = thumbnail_prefix(folder);
                    (
                        generate_key_with_extension(&file.name, Some(&prefix), WEBP_EXTENSION),
                        thumb,
                    )
                }),
            }
        } else {
            PreparedUpload {
                key: generate_key(&file.name, folder),
                data: file.data.clone(),
                content_type: normalize_mime_type(&file.mime_type),
                thumbnail: None,
            }
        };

        advance(stage, UploadStage::UploadingMain, &file.name);
        self.put_with_retry("Upload file", &prepared.key, &prepared.data, &prepared.content_type)
            .await?;

        if let Some((thumbnail_key, thumbnail_data)) = &prepared.thumbnail {
            advance(stage, UploadStage::UploadingThumbnail, &file.name);
            self.put_with_retry(
                "Upload thumbnail",
                thumbnail_key,
                thumbnail_data,
                WEBP_CONTENT_TYPE,
            )
            .await?;
        }

        advance(stage, UploadStage::ResolvingUrls, &file.name);
        let url = self.resolve_url(&prepared.key).await?;
        let (thumbnail_key, thumbnail_url) = match prepared.thumbnail {
            Some((thumbnail_key, _)) => {
                let thumbnail_url = self.resolve_url(&thumbnail_key).await?;
                (Some(thumbnail_key), Some(thumbnail_url))
            }
            None => (None, None),
        };

        advance(stage, UploadStage::Done, &file.name);
        tracing::info!(
            file_name = %file.name,
            key = %prepared.key,
            content_type = %prepared.content_type,
            size_bytes = prepared.data.len() as u64,
            thumbnail = thumbnail_key.is_some(),
            "File uploaded"
        );

        Ok(FileUploadResult {
            key: prepared.key,
            url,
            thumbnail_key,
            thumbnail_url,
            size: prepared.data.len() as u64,
            mime_type: prepared.content_type,
            original_name: file.name.clone(),
        })
    }

    /// Decode and re-encode off the async workers, retried as a whole.
    async fn transform(
        &self,
        file: &UploadFile,
        options: &FileUploadOptions,
    ) -> Result<TransformedImage, FileError> {
        self.retry
            .run("Process image", || {
                let data = file.data.clone();
                let name = file.name.clone();
                let options = options.clone();
                async move {
                    let file_name = name.clone();
                    match tokio::task::spawn_blocking(move || {
                        ImageTransformer::process(&name, &data, &options)
                    })
                    .await
                    {
                        Ok(result) => result,
                        Err(join_err) => Err(FileError::processing(
                            file_name,
                            anyhow::Error::new(join_err),
                        )),
                    }
                }
            })
            .await
    }

    async fn put_with_retry(
        &self,
        operation_name: &str,
        key: &str,
        data: &Bytes,
        content_type: &str,
    ) -> Result<(), FileError> {
        self.retry
            .run(operation_name, || {
                let data = data.clone();
                async move {
                    self.storage
                        .put(key, data, content_type, Some(IMMUTABLE_CACHE_CONTROL))
                        .await
                        .map_err(FileError::from)
                }
            })
            .await
    }

    async fn resolve_url(&self, key: &str) -> Result<String, FileError> {
        match &self.public_base_url {
            Some(base) => Ok(format!("{}/{}", base.trim_end_matches('/'), key)),
            None => self
                .storage
                .presign_get(key, self.presigned_url_ttl)
                .await
                .map_err(FileError::from),
        }
    }

    /// Upload files one after another, in input order.
    ///
    /// `on_progress` receives `(completed, total)` after each stored file. The
    /// first failure aborts the batch.
    pub async fn upload_files(
        &self,
        files: &[UploadFile],
        options: &FileUploadOptions,
        mut on_progress: Option<&mut (dyn FnMut(usize, usize) + Send)>,
    ) -> Result<Vec<FileUploadResult>, FileError> {
        let total = files.len();
        let mut results = Vec::with_capacity(total);

        for (index, file) in files.iter().enumerate() {
            let result = self.upload_file(file, options).await.map_err(|e| {
                tracing::warn!(
                    file_name = %file.name,
                    completed = index,
                    total,
                    "Batch upload aborted"
                );
                e
            })?;
            results.push(result);

            if let Some(callback) = on_progress.as_deref_mut() {
                callback(index + 1, total);
            }
        }

        Ok(results)
    }

    /// Delete an object. Deleting a key that does not exist succeeds.
    pub async fn delete_file(&self, key: &str) -> Result<(), FileError> {
        self.retry
            .run("Delete file", || async move {
                match self.storage.delete(key).await {
                    Ok(()) => Ok(()),
                    Err(StorageError::NotFound(_)) => {
                        tracing::debug!(key = %key, "Delete of missing file treated as success");
                        Ok(())
                    }
                    Err(e) => Err(FileError::from(e)),
                }
            })
            .await
    }

    /// Delete all `keys` concurrently, failing as soon as one delete fails.
    ///
    /// Every delete is dispatched before any result is awaited, so one failure
    /// does not stop the others from being issued.
    pub async fn delete_files(&self, keys: &[String]) -> Result<(), FileError> {
        let handles: Vec<_> = keys
            .iter()
            .cloned()
            .map(|key| {
                let service = self.clone();
                tokio::spawn(async move { service.delete_file(&key).await })
            })
            .collect();

        try_join_all(handles.into_iter().map(|handle| async move {
            match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(FileError::storage_with_source(
                    "Delete task failed",
                    anyhow::Error::new(join_err),
                )),
            }
        }))
        .await?;

        tracing::info!(count = keys.len(), "Files deleted");
        Ok(())
    }

    /// Presigned PUT URL for a direct client upload. Not retried: the client
    /// retries on its own.
    pub async fn generate_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, FileError> {
        self.storage
            .presign_put(key, content_type, expires_in)
            .await
            .map_err(FileError::from)
    }

    /// Object metadata; fails with `NotFound` when the key is absent.
    pub async fn file_metadata(&self, key: &str) -> Result<ObjectMetadata, FileError> {
        self.storage.head(key).await.map_err(FileError::from)
    }

    /// Remove stored objects that are not in `valid_keys`.
    ///
    /// Not implemented: nothing is listed or deleted yet.
    pub async fn cleanup_orphaned_files(&self, valid_keys: &HashSet<String>) -> Result<(), FileError> {
        tracing::warn!(
            valid_keys = valid_keys.len(),
            "Orphaned file cleanup is not implemented; no files were removed"
        );
        Ok(())
    }
}

fn advance(stage: &mut UploadStage, next: UploadStage, file_name: &str) {
    tracing::debug!(
        file_name = %file_name,
        from = %stage,
        to = %next,
        "Upload stage transition"
    );
    *stage = next;
}

fn log_upload_failure(err: &FileError, stage: UploadStage, file_name: &str) {
    let details = err.detailed_message();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(
            file_name = %file_name,
            stage = %stage,
            error_code = err.error_code(),
            error = %details,
            "Upload failed"
        ),
        LogLevel::Warn => tracing::warn!(
            file_name = %file_name,
            stage = %stage,
            error_code = err.error_code(),
            error = %details,
            "Upload failed"
        ),
        LogLevel::Error => tracing::error!(
            file_name = %file_name,
            stage = %stage,
            error_code = err.error_code(),
            error = %details,
            "Upload failed"
        ),
    }
}
