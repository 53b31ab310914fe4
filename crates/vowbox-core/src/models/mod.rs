//! Domain models for the upload pipeline.

pub mod upload;

pub use upload::{
    normalize_mime_type, FileUploadOptions, FileUploadResult, UploadFile, ValidationResult,
};
