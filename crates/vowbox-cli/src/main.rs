//! Vowbox CLI: operator access to the upload pipeline.
//!
//! Storage settings come from the environment (see `S3_*` variables); a `.env`
//! file in the working directory is loaded first.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use vowbox_cli::{init_tracing, read_upload_file, upload_options};
use vowbox_core::{client_safe_message, Config, ErrorMetadata, FileError};
use vowbox_services::{FileService, FileServiceConfig};
use vowbox_storage::create_storage;

#[derive(Parser)]
#[command(name = "vowbox", about = "Upload, delete and presign wedding documents and media")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files one after another
    Upload {
        /// Paths of the files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Key prefix, e.g. an organization directory
        #[arg(long)]
        folder: Option<String>,
        /// Optimize images and generate a thumbnail
        #[arg(long)]
        thumbnail: bool,
        /// Thumbnail box, e.g. 300x300 (implies --thumbnail)
        #[arg(long, value_name = "WxH")]
        thumbnail_size: Option<String>,
        /// Content type for every file (default: guessed from the extension)
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Delete objects by key
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Issue a presigned URL for a direct upload
    PresignUpload {
        key: String,
        #[arg(long)]
        content_type: String,
        /// Expiry in seconds
        #[arg(long, default_value = "3600")]
        ttl_secs: u64,
    },
    /// Show object metadata
    Head { key: String },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn run(command: Commands, service: &FileService, config: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Upload {
            paths,
            folder,
            thumbnail,
            thumbnail_size,
            content_type,
        } => {
            let options = upload_options(
                config.upload_options(),
                folder,
                thumbnail,
                thumbnail_size.as_deref(),
            )?;

            let mut files = Vec::with_capacity(paths.len());
            for path in &paths {
                files.push(read_upload_file(path, content_type.as_deref()).await?);
            }

            let mut on_progress = |completed: usize, total: usize| {
                eprintln!("Uploaded {}/{}", completed, total);
            };
            let results = service
                .upload_files(&files, &options, Some(&mut on_progress))
                .await?;
            print_json(&results)?;
        }
        Commands::Delete { keys } => {
            service.delete_files(&keys).await?;
            print_json(&serde_json::json!({ "deleted": keys }))?;
        }
        Commands::PresignUpload {
            key,
            content_type,
            ttl_secs,
        } => {
            let url = service
                .generate_presigned_upload_url(&key, &content_type, Duration::from_secs(ttl_secs))
                .await?;
            print_json(&serde_json::json!({
                "key": key,
                "url": url,
                "contentType": content_type,
                "expiresIn": ttl_secs,
            }))?;
        }
        Commands::Head { key } => {
            let meta = service.file_metadata(&key).await?;
            print_json(&serde_json::json!({
                "key": meta.key,
                "size": meta.size,
                "lastModified": meta.last_modified.to_rfc3339(),
                "eTag": meta.e_tag,
            }))?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage")?;
    let service = FileService::new(storage, FileServiceConfig::from(&config));

    if let Err(err) = run(cli.command, &service, &config).await {
        match err.downcast_ref::<FileError>() {
            Some(file_error) => {
                tracing::error!(
                    error_code = file_error.error_code(),
                    error = %file_error.detailed_message(),
                    "Command failed"
                );
                eprintln!("Error: {}", client_safe_message(file_error));
            }
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }

    Ok(())
}
