//! Vowbox Storage Library
//!
//! This crate provides the storage contract used by the upload pipeline and its
//! S3-compatible implementation.
//!
//! # Storage key format
//!
//! Keys are generated by the [`keys`] module as
//! `{prefix/}{sanitized-name}-{unix-millis}-{8-hex}{.ext}`. Derived thumbnails live
//! under `{prefix/}thumbnails/`.
//!
//! Keys must not be empty, contain `..` or start with `/`. Backends reject such
//! keys with [`StorageError::InvalidKey`].

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{generate_key, generate_key_with_extension, thumbnail_prefix, validate_key};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ObjectMetadata, Storage, StorageError, StorageResult};
