//! Shared key generation for storage backends.
//!
//! Key format: `{prefix/}{sanitized-name}-{unix-millis}-{8-hex}{.ext}`. Uniqueness
//! comes from the (timestamp, random) pair, not from content hashing, so the same
//! bytes uploaded twice get two keys.

use chrono::Utc;

use crate::traits::{StorageError, StorageResult};

const FALLBACK_BASE_NAME: &str = "file";
const THUMBNAIL_DIR: &str = "thumbnails";

/// Generate a storage key for `original_name`, optionally under `prefix`.
///
/// Every character of the base name outside `[A-Za-z0-9]` becomes `-`. The
/// extension keeps only its ASCII alphanumerics; names without one produce a key
/// without one.
pub fn generate_key(original_name: &str, prefix: Option<&str>) -> String {
    let (base, extension) = split_extension(original_name);
    build_key(base, extension.map(sanitize_extension).as_deref(), prefix)
}

/// Like [`generate_key`] but with the extension replaced, used when the stored
/// bytes were re-encoded into another format.
pub fn generate_key_with_extension(original_name: &str, prefix: Option<&str>, extension: &str) -> String {
    let (base, _) = split_extension(original_name);
    build_key(base, Some(&sanitize_extension(extension)), prefix)
}

/// Prefix under which thumbnails of files stored under `folder` are kept.
pub fn thumbnail_prefix(folder: Option<&str>) -> String {
    match folder.map(|f| f.trim_end_matches('/')).filter(|f| !f.is_empty()) {
        Some(folder) => format!("{}/{}", folder, THUMBNAIL_DIR),
        None => THUMBNAIL_DIR.to_string(),
    }
}

/// Reject keys that could escape the bucket namespace.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}

fn build_key(base: &str, extension: Option<&str>, prefix: Option<&str>) -> String {
    let mut base = sanitize_base_name(base);
    if base.is_empty() {
        base = FALLBACK_BASE_NAME.to_string();
    }

    let suffix = format!(
        "{}-{}-{:08x}",
        base,
        Utc::now().timestamp_millis(),
        rand::random::<u32>()
    );

    let file_name = match extension.filter(|ext| !ext.is_empty()) {
        Some(ext) => format!("{}.{}", suffix, ext),
        None => suffix,
    };

    match prefix.map(|p| p.trim_end_matches('/')).filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}/{}", prefix, file_name),
        None => file_name,
    }
}

/// Split at the last dot. Leading-dot names (".env") have no extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base, Some(ext)),
        _ => (name, None),
    }
}

fn sanitize_base_name(base: &str) -> String {
    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

fn sanitize_extension(ext: &str) -> String {
    ext.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}
