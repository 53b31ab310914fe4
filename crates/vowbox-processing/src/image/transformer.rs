//! Image transformer - prepares uploaded images for storage
//!
//! Decodes the upload, downsamples it when either side exceeds
//! [`MAX_IMAGE_DIMENSION`], re-encodes it to WebP and optionally derives a
//! cover-fit thumbnail from the original decoded image.

use crate::compression::{compress_webp, THUMBNAIL_WEBP_QUALITY, WEBP_QUALITY};
use crate::image::resize::{ImageResize, ThumbnailSize};
use crate::validator::FileValidator;
use anyhow::Context;
use bytes::Bytes;
use image::GenericImageView;
use std::io::Cursor;
use vowbox_core::{FileError, FileUploadOptions};

/// Longest side allowed for a stored image, in pixels
pub const MAX_IMAGE_DIMENSION: u32 = 2048;

/// Output of a successful transformation
#[derive(Debug, Clone)]
pub struct TransformedImage {
    /// WebP encoding of the (possibly downscaled) image
    pub optimized: Bytes,
    pub thumbnail: Option<Bytes>,
    pub width: u32,
    pub height: u32,
}

pub struct ImageTransformer;

impl ImageTransformer {
    /// Transform `data`, reporting any failure as a processing error for `file_name`.
    ///
    /// There is no fallback to the untransformed bytes: a caller that asked for a
    /// transformation either gets WebP output or an error.
    pub fn process(
        file_name: &str,
        data: &[u8],
        options: &FileUploadOptions,
    ) -> Result<TransformedImage, FileError> {
        FileValidator::validate_thumbnail_size(options)?;

        let thumbnail = if options.generate_thumbnail {
            Some(ThumbnailSize {
                width: options.thumbnail_width,
                height: options.thumbnail_height,
            })
        } else {
            None
        };

        Self::transform(data, thumbnail).map_err(|e| {
            tracing::warn!(
                file_name = %file_name,
                error = %e,
                "Image transformation failed"
            );
            FileError::processing(file_name, e)
        })
    }

    fn transform(data: &[u8], thumbnail: Option<ThumbnailSize>) -> anyhow::Result<TransformedImage> {
        let cursor = Cursor::new(data);
        let original = image::ImageReader::new(cursor)
            .with_guessed_format()
            .context("Failed to read image header")?
            .decode()
            .context("Failed to decode image")?;

        let (orig_width, orig_height) = original.dimensions();

        let thumbnail = match thumbnail {
            Some(size) => {
                let thumb = ImageResize::cover(&original, size);
                Some(
                    compress_webp(&thumb, THUMBNAIL_WEBP_QUALITY)
                        .context("Failed to encode thumbnail")?,
                )
            }
            None => None,
        };

        let resized = ImageResize::downscale_to_fit(original, MAX_IMAGE_DIMENSION);
        let (width, height) = resized.dimensions();
        if (width, height) != (orig_width, orig_height) {
            tracing::debug!(
                orig_width,
                orig_height,
                width,
                height,
                "Downscaled oversized image"
            );
        }

        let optimized = compress_webp(&resized, WEBP_QUALITY).context("Failed to encode image")?;

        Ok(TransformedImage {
            optimized,
            thumbnail,
            width,
            height,
        })
    }
}
