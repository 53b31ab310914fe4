use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_THUMBNAIL_HEIGHT,
    DEFAULT_THUMBNAIL_WIDTH, MIB,
};

/// A file received from a client, fully buffered in memory.
#[derive(Clone, Debug)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let mime_type: String = mime_type.into();
        Self {
            name: name.into(),
            mime_type: normalize_mime_type(&mime_type),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .trim_start()
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
    }
}

/// Lowercased, trimmed MIME type.
pub fn normalize_mime_type(mime_type: &str) -> String {
    mime_type.trim().to_ascii_lowercase()
}

/// Per-call upload configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileUploadOptions {
    pub generate_thumbnail: bool,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub max_file_size: u64,
    /// Exact MIME types accepted; order is kept for error messages.
    pub allowed_mime_types: Vec<String>,
    /// Key prefix, e.g. an organization-scoped directory.
    pub folder: Option<String>,
}

impl Default for FileUploadOptions {
    fn default() -> Self {
        Self {
            generate_thumbnail: false,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            thumbnail_height: DEFAULT_THUMBNAIL_HEIGHT,
            max_file_size: DEFAULT_MAX_FILE_SIZE_MB * MIB,
            allowed_mime_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            folder: None,
        }
    }
}

impl FileUploadOptions {
    pub fn with_thumbnail(mut self, width: u32, height: u32) -> Self {
        self.generate_thumbnail = true;
        self.thumbnail_width = width;
        self.thumbnail_height = height;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_allowed_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_mime_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }
}

/// Output of a successful upload. Created once, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUploadResult {
    pub key: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Bytes written for the main asset.
    pub size: u64,
    /// Content type of the stored bytes.
    pub mime_type: String,
    pub original_name: String,
}

/// Outcome of validating a file. Never an error; callers branch on `is_valid`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}
