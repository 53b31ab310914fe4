//! Error types module
//!
//! Every failure in the upload pipeline is normalized into [`FileError`], a closed
//! set of kinds. Each kind self-describes its HTTP status, stable error code,
//! retryability and the message that is safe to show to an end user through
//! [`ErrorMetadata`].
//!
//! Validation messages are user-actionable and returned verbatim. Storage and
//! processing failures carry backend detail, so clients only ever see a generic
//! message for them.

use std::fmt::{Display, Formatter, Result as FmtResult};

const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error occurred";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "STORAGE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is transient and the operation may be retried
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (never contains backend internals)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Which constraint a file violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    FileTooLarge,
    InvalidType,
    Constraint,
}

impl Display for ValidationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ValidationKind::FileTooLarge => write!(f, "size"),
            ValidationKind::InvalidType => write!(f, "type"),
            ValidationKind::Constraint => write!(f, "constraint"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("{message}")]
    Validation {
        kind: ValidationKind,
        message: String,
    },

    #[error("{message}")]
    Storage {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Failed to process {file_name}: {message}")]
    Processing {
        file_name: String,
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("File not found: {key}")]
    NotFound { key: String },

    #[error("Access denied: {operation}")]
    AccessDenied {
        operation: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl FileError {
    pub fn validation(kind: ValidationKind, message: impl Into<String>) -> Self {
        FileError::Validation {
            kind,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        FileError::Storage {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        FileError::Storage {
            message: message.into(),
            source: Some(source),
        }
    }

    pub fn processing(file_name: impl Into<String>, source: anyhow::Error) -> Self {
        FileError::Processing {
            file_name: file_name.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        FileError::NotFound { key: key.into() }
    }

    pub fn access_denied(operation: impl Into<String>) -> Self {
        FileError::AccessDenied {
            operation: operation.into(),
            source: None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FileError::Validation { .. })
    }

    /// Get the error kind name for detailed error reporting
    pub fn kind_name(&self) -> &'static str {
        match self {
            FileError::Validation { .. } => "ValidationError",
            FileError::Storage { .. } => "StorageError",
            FileError::Processing { .. } => "ProcessingError",
            FileError::NotFound { .. } => "NotFoundError",
            FileError::AccessDenied { .. } => "AccessError",
        }
    }

    /// Get detailed error information including the cause chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn file_error_static_metadata(err: &FileError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        FileError::Validation {
            kind: ValidationKind::FileTooLarge,
            ..
        } => (413, "FILE_TOO_LARGE", false, LogLevel::Debug),
        FileError::Validation {
            kind: ValidationKind::InvalidType,
            ..
        } => (415, "INVALID_FILE_TYPE", false, LogLevel::Debug),
        FileError::Validation {
            kind: ValidationKind::Constraint,
            ..
        } => (400, "VALIDATION_ERROR", false, LogLevel::Debug),
        FileError::Storage { .. } => (500, "STORAGE_ERROR", true, LogLevel::Error),
        FileError::Processing { .. } => (422, "PROCESSING_ERROR", true, LogLevel::Warn),
        FileError::NotFound { .. } => (404, "NOT_FOUND", false, LogLevel::Debug),
        FileError::AccessDenied { .. } => (403, "ACCESS_DENIED", false, LogLevel::Warn),
    }
}

impl ErrorMetadata for FileError {
    fn http_status_code(&self) -> u16 {
        file_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        file_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        file_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        file_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            FileError::Validation { message, .. } => message.clone(),
            FileError::NotFound { .. } => "File not found".to_string(),
            FileError::AccessDenied { .. } => "Access denied".to_string(),
            FileError::Processing { .. } => "Failed to process file. Please try again.".to_string(),
            FileError::Storage { .. } => "Upload failed. Please try again.".to_string(),
        }
    }
}

/// Normalize any caught failure into a [`FileError`].
///
/// Taxonomy errors pass through unchanged. Anything else becomes a storage error
/// whose message is prefixed with `context`, or the generic unknown-error message
/// when the failure has no text of its own.
pub fn classify(err: anyhow::Error, context: Option<&str>) -> FileError {
    match err.downcast::<FileError>() {
        Ok(file_error) => file_error,
        Err(err) => {
            let message = err.to_string();
            if message.trim().is_empty() {
                return FileError::storage_with_source(UNKNOWN_ERROR_MESSAGE, err);
            }
            let message = match context {
                Some(ctx) if !ctx.is_empty() => format!("{}: {}", ctx, message),
                _ => message,
            };
            FileError::storage_with_source(message, err)
        }
    }
}

/// Only storage and processing failures are worth another attempt.
pub fn is_retryable(err: &FileError) -> bool {
    err.is_recoverable()
}

pub fn client_safe_message(err: &FileError) -> String {
    err.client_message()
}
