use image::{imageops, DynamicImage, GenericImageView};

/// Fixed thumbnail box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailSize {
    /// Parse dimensions from string format: "WxH"
    pub fn parse(s: &str) -> Result<Self, String> {
        let (width, height) = s
            .split_once('x')
            .ok_or_else(|| "Invalid dimensions format. Expected: WxH".to_string())?;

        let width = width
            .parse::<u32>()
            .map_err(|_| format!("Invalid width: {}", width))?;
        let height = height
            .parse::<u32>()
            .map_err(|_| format!("Invalid height: {}", height))?;

        if width == 0 || height == 0 {
            return Err("Thumbnail dimensions must be greater than zero".to_string());
        }

        Ok(ThumbnailSize { width, height })
    }
}

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Dimensions that fit inside a `max_side` square, preserving aspect ratio.
    /// Never upscales.
    pub fn fit_within(orig_width: u32, orig_height: u32, max_side: u32) -> (u32, u32) {
        if orig_width <= max_side && orig_height <= max_side {
            return (orig_width, orig_height);
        }

        if orig_width >= orig_height {
            let h = (orig_height as f64 * max_side as f64 / orig_width as f64).round() as u32;
            (max_side, h.max(1))
        } else {
            let w = (orig_width as f64 * max_side as f64 / orig_height as f64).round() as u32;
            (w.max(1), max_side)
        }
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width.max(1) as f32;
        let height_ratio = orig_height as f32 / new_height.max(1) as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            imageops::FilterType::CatmullRom
        } else {
            imageops::FilterType::Lanczos3
        }
    }

    /// Shrink `img` so neither side exceeds `max_side`. Images already inside the
    /// bound are returned untouched.
    pub fn downscale_to_fit(img: DynamicImage, max_side: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) = Self::fit_within(orig_width, orig_height, max_side);
        if (width, height) == (orig_width, orig_height) {
            return img;
        }

        let filter = Self::select_filter(orig_width, orig_height, width, height);
        img.resize_exact(width, height, filter)
    }

    /// Scale to cover `size` and crop the overflow around the center.
    pub fn cover(img: &DynamicImage, size: ThumbnailSize) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let filter = Self::select_filter(orig_width, orig_height, size.width, size.height);
        img.resize_to_fill(size.width, size.height, filter)
    }
}
