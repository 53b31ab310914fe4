//! Vowbox Core Library
//!
//! This crate provides the shared pieces of the upload pipeline: the file error
//! taxonomy and its classifier, configuration, and the upload data model used by
//! storage, processing and the service layer.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, RetryConfig, StorageConfig, UploadDefaults};
pub use error::{
    classify, client_safe_message, is_retryable, ErrorMetadata, FileError, LogLevel,
    ValidationKind,
};
pub use models::{
    normalize_mime_type, FileUploadOptions, FileUploadResult, UploadFile, ValidationResult,
};
