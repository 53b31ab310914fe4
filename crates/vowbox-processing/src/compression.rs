use anyhow::{anyhow, Result};
use bytes::Bytes;
use image::{DynamicImage, GenericImageView};

/// WebP quality for the stored main asset (0-100)
pub const WEBP_QUALITY: f32 = 85.0;

/// WebP quality for derived thumbnails (0-100)
pub const THUMBNAIL_WEBP_QUALITY: f32 = 80.0;

/// Content type of everything produced by this module
pub const WEBP_CONTENT_TYPE: &str = "image/webp";

/// Encode to lossy WebP at the given quality.
pub fn compress_webp(img: &DynamicImage, quality: f32) -> Result<Bytes> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow!("Cannot encode an empty {}x{} image", width, height));
    }

    // Convert to RGBA for WebP encoding
    let rgba_img = img.to_rgba8();

    let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
    let webp_data = encoder
        .encode_simple(false, quality.clamp(0.0, 100.0))
        .map_err(|e| anyhow!("WebP encoding failed: {:?}", e))?;

    Ok(Bytes::copy_from_slice(&webp_data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    #[test]
    fn test_compress_webp_produces_webp() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([200, 120, 80])));
        let out = compress_webp(&img, WEBP_QUALITY).unwrap();
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(&out[8..12], b"WEBP");

        let decoded = image::load_from_memory_with_format(&out, ImageFormat::WebP).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_lower_quality_is_not_larger() {
        let mut img = RgbImage::new(128, 128);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x ^ y) % 256) as u8]);
        }
        let img = DynamicImage::ImageRgb8(img);
        let high = compress_webp(&img, 95.0).unwrap();
        let low = compress_webp(&img, 20.0).unwrap();
        assert!(low.len() <= high.len());
    }
}
