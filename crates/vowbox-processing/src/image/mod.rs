//! Image optimization: bounded downscale, WebP re-encode and cover-fit thumbnails.

pub mod resize;
pub mod transformer;

pub use resize::{ImageResize, ThumbnailSize};
pub use transformer::{ImageTransformer, TransformedImage, MAX_IMAGE_DIMENSION};
