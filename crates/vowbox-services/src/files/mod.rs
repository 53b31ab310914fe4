pub mod service;

pub use service::{FileService, FileServiceConfig, UploadStage, IMMUTABLE_CACHE_CONTROL};
