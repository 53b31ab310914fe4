use anyhow::Context;
use std::path::Path;
use vowbox_core::{FileUploadOptions, UploadFile};
use vowbox_processing::{content_type_for_file_name, ThumbnailSize};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for an upload: the explicit one, else guessed from the extension.
pub fn resolve_content_type(file_name: &str, explicit: Option<&str>) -> String {
    explicit
        .map(|ct| ct.trim().to_lowercase())
        .or_else(|| content_type_for_file_name(file_name).map(String::from))
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Read a file from disk into an upload.
pub async fn read_upload_file(path: &Path, content_type: Option<&str>) -> anyhow::Result<UploadFile> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    let content_type = resolve_content_type(&name, content_type);
    Ok(UploadFile::new(name, content_type, data))
}

/// Apply command line overrides on top of the configured upload defaults.
pub fn upload_options(
    defaults: FileUploadOptions,
    folder: Option<String>,
    thumbnail: bool,
    thumbnail_size: Option<&str>,
) -> anyhow::Result<FileUploadOptions> {
    let mut options = defaults;
    if let Some(folder) = folder {
        options = options.with_folder(folder);
    }
    if thumbnail || thumbnail_size.is_some() {
        let size = match thumbnail_size {
            Some(s) => ThumbnailSize::parse(s).map_err(anyhow::Error::msg)?,
            None => ThumbnailSize {
                width: options.thumbnail_width,
                height: options.thumbnail_height,
            },
        };
        options = options.with_thumbnail(size.width, size.height);
    }
    Ok(options)
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
