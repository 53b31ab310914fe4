//! Vowbox Services
//!
//! Retry with exponential backoff and the upload/delete orchestration built on
//! top of the storage and processing crates.

pub mod files;
pub mod retry;

// Re-export commonly used types
pub use files::{FileService, FileServiceConfig, UploadStage, IMMUTABLE_CACHE_CONTROL};
pub use retry::{retry, RetryExecutor, RetryPolicy, Sleeper, TokioSleeper};

// Re-export storage and core types so consumers need a single dependency
pub use vowbox_core::{
    classify, client_safe_message, is_retryable, FileError, FileUploadOptions, FileUploadResult,
    UploadFile, ValidationResult,
};
pub use vowbox_storage::{ObjectMetadata, Storage, StorageError, StorageResult};
