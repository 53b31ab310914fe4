use std::path::Path;
use vowbox_core::constants::{MAX_THUMBNAIL_DIMENSION, MIB};
use vowbox_core::{FileError, FileUploadOptions, UploadFile, ValidationKind, ValidationResult};

/// Upload validator
///
/// Checks run before any network call, in a fixed order: empty file, size,
/// content type, then requested thumbnail size. When a file fails several
/// checks the first one wins.
pub struct FileValidator;

impl FileValidator {
    /// Validate and return the violated constraint as a [`FileError`].
    pub fn check(file: &UploadFile, options: &FileUploadOptions) -> Result<(), FileError> {
        Self::validate_not_empty(file)?;
        Self::validate_file_size(file, options.max_file_size)?;
        Self::validate_content_type(&file.mime_type, &options.allowed_mime_types)?;
        Self::validate_thumbnail_size(options)?;
        Ok(())
    }

    /// Validate without failing; callers branch on `is_valid`.
    pub fn validate(file: &UploadFile, options: &FileUploadOptions) -> ValidationResult {
        match Self::check(file, options) {
            Ok(()) => ValidationResult::valid(),
            Err(e) => ValidationResult::invalid(e.to_string()),
        }
    }

    fn validate_not_empty(file: &UploadFile) -> Result<(), FileError> {
        if file.data.is_empty() {
            return Err(FileError::validation(
                ValidationKind::Constraint,
                format!("File \"{}\" is empty.", file.name),
            ));
        }
        Ok(())
    }

    /// Validate file size
    fn validate_file_size(file: &UploadFile, max_file_size: u64) -> Result<(), FileError> {
        let size = file.size();
        if size > max_file_size {
            let actual_mb = size as f64 / MIB as f64;
            let max_mb = (max_file_size as f64 / MIB as f64).round() as u64;
            return Err(FileError::validation(
                ValidationKind::FileTooLarge,
                format!(
                    "File \"{}\" is too large ({:.2} MB). Maximum size is {} MB.",
                    file.name, actual_mb, max_mb
                ),
            ));
        }
        Ok(())
    }

    /// Validate content type
    fn validate_content_type(content_type: &str, allowed: &[String]) -> Result<(), FileError> {
        let normalized = content_type.trim().to_lowercase();

        if !allowed.iter().any(|ct| ct.eq_ignore_ascii_case(&normalized)) {
            return Err(FileError::validation(
                ValidationKind::InvalidType,
                format!(
                    "File type \"{}\" is not allowed. Allowed types: {}",
                    content_type,
                    allowed.join(", ")
                ),
            ));
        }
        Ok(())
    }

    /// Thumbnail sides must be within `1..=MAX_THUMBNAIL_DIMENSION` when one is requested
    pub fn validate_thumbnail_size(options: &FileUploadOptions) -> Result<(), FileError> {
        if !options.generate_thumbnail {
            return Ok(());
        }
        let in_range = |side: u32| (1..=MAX_THUMBNAIL_DIMENSION).contains(&side);
        if !in_range(options.thumbnail_width) || !in_range(options.thumbnail_height) {
            return Err(FileError::validation(
                ValidationKind::Constraint,
                format!(
                    "Thumbnail size {}x{} is invalid. Each side must be between 1 and {} pixels.",
                    options.thumbnail_width, options.thumbnail_height, MAX_THUMBNAIL_DIMENSION
                ),
            ));
        }
        Ok(())
    }
}

/// Content type expected for a file extension, if it is a known one.
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    let content_type = match extension.to_lowercase().as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        // Documents
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "zip" => "application/zip",
        _ => return None,
    };
    Some(content_type)
}

/// Content type guessed from a file name's extension.
pub fn content_type_for_file_name(file_name: &str) -> Option<&'static str> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(content_type_for_extension)
}
