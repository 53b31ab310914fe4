//! Shared constants for the upload pipeline.

/// Bytes in one mebibyte.
pub const MIB: u64 = 1024 * 1024;

pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 300;
pub const DEFAULT_THUMBNAIL_HEIGHT: u32 = 300;
/// Largest accepted thumbnail side, in pixels.
pub const MAX_THUMBNAIL_DIMENSION: u32 = 2048;

pub const DEFAULT_MAX_FILE_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Expiry of presigned GET URLs handed out in upload results.
pub const DEFAULT_PRESIGNED_URL_TTL_SECS: u64 = 3600;

/// Content types accepted when no explicit allow-list is configured.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];
