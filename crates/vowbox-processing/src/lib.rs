//! Vowbox Processing Library
//!
//! Pure, network-free steps of the upload pipeline: file validation and image
//! optimization (downscale, WebP re-encode, cover-fit thumbnails).

#[cfg(feature = "image")]
pub mod compression;
#[cfg(feature = "image")]
pub mod image;
pub mod validator;

#[cfg(feature = "image")]
pub use self::image::{ImageResize, ImageTransformer, ThumbnailSize, TransformedImage};
pub use validator::{content_type_for_extension, content_type_for_file_name, FileValidator};
