//! Configuration module
//!
//! Storage credentials, retry tuning and upload defaults are read from the
//! environment (optionally seeded from a `.env` file). Business logic never reads
//! the environment itself: the service layer receives these values explicitly.

use std::env;

use crate::constants::{
    DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_MAX_FILE_RETRIES, DEFAULT_MAX_FILE_SIZE_MB,
    DEFAULT_PRESIGNED_URL_TTL_SECS, DEFAULT_RETRY_DELAY_MS, DEFAULT_THUMBNAIL_HEIGHT,
    DEFAULT_THUMBNAIL_WIDTH, MAX_THUMBNAIL_DIMENSION, MIB,
};
use crate::models::FileUploadOptions;

const DEFAULT_REGION: &str = "auto";

/// Object store connection settings
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub account_id: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// When set, object URLs are `{public_url}/{key}` instead of presigned.
    pub public_url: Option<String>,
}

impl StorageConfig {
    /// Endpoint to talk to: the explicit one, else the account-scoped R2 endpoint.
    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint.clone().or_else(|| {
            self.account_id
                .as_ref()
                .map(|account| format!("https://{}.r2.cloudflarestorage.com", account))
        })
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(key), Some(secret)) => Some((key.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_file_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_file_retries: DEFAULT_MAX_FILE_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadDefaults {
    pub max_file_size_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub presigned_url_ttl_secs: u64,
}

impl Default for UploadDefaults {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * MIB,
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            thumbnail_height: DEFAULT_THUMBNAIL_HEIGHT,
            presigned_url_ttl_secs: DEFAULT_PRESIGNED_URL_TTL_SECS,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub storage: StorageConfig,
    pub retry: RetryConfig,
    pub uploads: UploadDefaults,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        let storage = StorageConfig {
            bucket: var("S3_BUCKET")
                .ok_or_else(|| anyhow::anyhow!("S3_BUCKET must be set"))?,
            region: var("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint: var("S3_ENDPOINT"),
            account_id: var("S3_ACCOUNT_ID"),
            access_key_id: var("S3_ACCESS_KEY_ID"),
            secret_access_key: var("S3_SECRET_ACCESS_KEY"),
            public_url: var("S3_PUBLIC_URL").map(|s| s.trim_end_matches('/').to_string()),
        };

        let retry = RetryConfig {
            max_file_retries: var("MAX_FILE_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_FILE_RETRIES),
            retry_delay_ms: var("RETRY_DELAY_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_DELAY_MS),
        };

        let max_file_size_bytes = var("MAX_FILE_SIZE_MB")
            .and_then(|s| s.parse::<u64>().ok())
            .and_then(|mb| mb.checked_mul(MIB))
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_MB * MIB);

        let allowed_content_types = var("ALLOWED_CONTENT_TYPES")
            .map(|s| {
                s.split(',')
                    .map(|ct| ct.trim().to_lowercase())
                    .filter(|ct| !ct.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                DEFAULT_ALLOWED_CONTENT_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let uploads = UploadDefaults {
            max_file_size_bytes,
            allowed_content_types,
            thumbnail_width: var("THUMBNAIL_WIDTH")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_THUMBNAIL_WIDTH),
            thumbnail_height: var("THUMBNAIL_HEIGHT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_THUMBNAIL_HEIGHT),
            presigned_url_ttl_secs: var("PRESIGNED_URL_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PRESIGNED_URL_TTL_SECS),
        };

        Ok(Config {
            storage,
            retry,
            uploads,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage.bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("S3_BUCKET must not be empty"));
        }

        if self.storage.access_key_id.is_some() != self.storage.secret_access_key.is_some() {
            return Err(anyhow::anyhow!(
                "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together"
            ));
        }

        if self.retry.max_file_retries == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_RETRIES must be at least 1"));
        }

        let thumbnail_range = 1..=MAX_THUMBNAIL_DIMENSION;
        if !thumbnail_range.contains(&self.uploads.thumbnail_width)
            || !thumbnail_range.contains(&self.uploads.thumbnail_height)
        {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_WIDTH and THUMBNAIL_HEIGHT must be between 1 and {}",
                MAX_THUMBNAIL_DIMENSION
            ));
        }

        if self.uploads.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must list at least one content type"
            ));
        }

        Ok(())
    }

    /// Default per-call upload options derived from configuration.
    pub fn upload_options(&self) -> FileUploadOptions {
        FileUploadOptions {
            generate_thumbnail: false,
            thumbnail_width: self.uploads.thumbnail_width,
            thumbnail_height: self.uploads.thumbnail_height,
            max_file_size: self.uploads.max_file_size_bytes,
            allowed_mime_types: self.uploads.allowed_content_types.clone(),
            folder: None,
        }
    }

    pub fn public_url(&self) -> Option<&str> {
        self.storage.public_url.as_deref()
    }
}
