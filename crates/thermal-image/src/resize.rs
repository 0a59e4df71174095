//! Aspect-ratio-preserving resize to the printer paper width.
//!
//! Uses Lanczos3 filtering, since sources are usually much wider than the
//! 384px print head and need heavy downsampling without aliasing.

use image::imageops::{self, FilterType};
use image::Rgba32FImage;
use tracing::debug;

use crate::raster::{ChannelLayout, RasterImage};
use crate::{Result, ThermalImageError};

/// Default cap on output rows (about 2 m of paper at 8 dots/mm).
pub const MAX_OUTPUT_HEIGHT: u32 = 16_384;

/// Height that keeps the aspect ratio when scaling `(orig_w, orig_h)` to `width`.
///
/// Rounded to nearest, never below 1.
pub fn scaled_height(orig_w: u32, orig_h: u32, width: u32) -> u32 {
    let ratio = f64::from(width) / f64::from(orig_w);
    let new_height = (f64::from(orig_h) * ratio).round() as u32;
    new_height.max(1)
}

/// Resize a raster to a target width while maintaining aspect ratio.
///
/// Returns the input unchanged if it already matches the target width.
/// The channel layout is preserved. Translucent RGBA rasters are filtered
/// with premultiplied alpha.
///
/// # Errors
/// - `Config` if `width` or `max_height` is zero
/// - `InvalidInput` if the output would be taller than `max_height` rows
pub fn resize_to_width(img: RasterImage, width: u32, max_height: u32) -> Result<RasterImage> {
    if width == 0 {
        return Err(ThermalImageError::Config(
            "target width must be greater than 0".into(),
        ));
    }
    if max_height == 0 {
        return Err(ThermalImageError::Config(
            "maximum output height must be greater than 0".into(),
        ));
    }

    let (orig_w, orig_h) = img.dimensions();
    let new_height = if orig_w == width {
        orig_h
    } else {
        scaled_height(orig_w, orig_h, width)
    };
    if new_height > max_height {
        return Err(ThermalImageError::InvalidInput(format!(
            "{orig_w}x{orig_h} image would be {new_height} rows at width {width}, limit is {max_height}"
        )));
    }

    if orig_w == width {
        debug!(width, "Image already at target width, skipping resize");
        return Ok(img);
    }

    debug!(
        orig_w,
        orig_h,
        new_width = width,
        new_height,
        "Resizing image to target width"
    );

    let layout = img.layout();
    let pixels = match layout {
        ChannelLayout::Rgba8 if has_translucency(&img) => {
            resize_premultiplied(&img, width, new_height)?
        }
        ChannelLayout::Gray8 => img
            .to_dynamic()?
            .resize_exact(width, new_height, FilterType::Lanczos3)
            .into_luma8()
            .into_raw(),
        ChannelLayout::Rgba8 => img
            .to_dynamic()?
            .resize_exact(width, new_height, FilterType::Lanczos3)
            .into_rgba8()
            .into_raw(),
    };
    RasterImage::new(width, new_height, layout, pixels)
}

fn has_translucency(img: &RasterImage) -> bool {
    img.pixels().chunks_exact(4).any(|px| px[3] < 255)
}

/// Lanczos3 over premultiplied RGBA, so fully transparent pixels carry no
/// color into their neighbours.
fn resize_premultiplied(img: &RasterImage, width: u32, height: u32) -> Result<Vec<u8>> {
    let premultiplied: Vec<f32> = img
        .pixels()
        .chunks_exact(4)
        .flat_map(|px| {
            let a = f32::from(px[3]) / 255.0;
            [
                f32::from(px[0]) / 255.0 * a,
                f32::from(px[1]) / 255.0 * a,
                f32::from(px[2]) / 255.0 * a,
                a,
            ]
        })
        .collect();
    let (orig_w, orig_h) = img.dimensions();
    let buf = Rgba32FImage::from_raw(orig_w, orig_h, premultiplied).ok_or_else(|| {
        ThermalImageError::InvalidInput("RGBA buffer does not match its dimensions".into())
    })?;

    let resized = imageops::resize(&buf, width, height, FilterType::Lanczos3);
    Ok(resized
        .into_raw()
        .chunks_exact(4)
        .flat_map(|px| {
            let a = px[3].clamp(0.0, 1.0);
            if a <= 0.0 {
                return [0, 0, 0, 0];
            }
            [
                unit_to_u8(px[0] / a),
                unit_to_u8(px[1] / a),
                unit_to_u8(px[2] / a),
                unit_to_u8(a),
            ]
        })
        .collect())
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_image(width: u32, height: u32) -> RasterImage {
        RasterImage::from_pixel(width, height, ChannelLayout::Gray8, &[128]).unwrap()
    }

    #[test]
    fn test_resize_to_width_downscale() {
        let img = create_test_image(1000, 500);
        let result = resize_to_width(img, 384, MAX_OUTPUT_HEIGHT).unwrap();
        assert_eq!(result.dimensions(), (384, 192));
    }

    #[test]
    fn test_resize_to_width_upscale() {
        let img = create_test_image(200, 100);
        let result = resize_to_width(img, 400, MAX_OUTPUT_HEIGHT).unwrap();
        assert_eq!(result.dimensions(), (400, 200));
    }

    #[test]
    fn test_resize_to_width_same_width() {
        let img = create_test_image(384, 500);
        let result = resize_to_width(img.clone(), 384, MAX_OUTPUT_HEIGHT).unwrap();
        assert_eq!(result, img);
    }

    #[test]
    fn test_resize_to_width_paper_width() {
        let img = create_test_image(1920, 1080);
        let result = resize_to_width(img, crate::PAPER_WIDTH, MAX_OUTPUT_HEIGHT).unwrap();
        // 1080 * (384/1920) = 216
        assert_eq!(result.dimensions(), (384, 216));
    }

    #[test]
    fn test_resize_rounds_to_nearest_height() {
        // 100 * 384 / 300 = 128.0; 101 * 384 / 300 = 129.28 -> 129; 102 -> 130.56 -> 131
        assert_eq!(scaled_height(300, 100, 384), 128);
        assert_eq!(scaled_height(300, 101, 384), 129);
        assert_eq!(scaled_height(300, 102, 384), 131);
    }

    #[test]
    fn test_resize_preserves_rgba_layout() {
        let img = RasterImage::from_pixel(64, 32, ChannelLayout::Rgba8, &[255, 0, 0, 128]).unwrap();
        let result = resize_to_width(img, 16, MAX_OUTPUT_HEIGHT).unwrap();
        assert_eq!(result.layout(), ChannelLayout::Rgba8);
        assert_eq!(result.dimensions(), (16, 8));
    }

    #[test]
    fn test_resize_preserves_non_zero_dimensions() {
        // Very wide, very short image
        let img = create_test_image(1000, 1);
        let result = resize_to_width(img, 10, MAX_OUTPUT_HEIGHT).unwrap();
        assert_eq!(result.width(), 10);
        assert!(result.height() >= 1, "Height should be at least 1");
    }

    #[test]
    fn test_resize_rejects_zero_width() {
        let img = create_test_image(10, 10);
        let result = resize_to_width(img, 0, MAX_OUTPUT_HEIGHT);
        assert!(matches!(result, Err(ThermalImageError::Config(_))));
    }

    #[test]
    fn test_resize_rejects_zero_max_height() {
        let img = create_test_image(10, 10);
        let result = resize_to_width(img, 5, 0);
        assert!(matches!(result, Err(ThermalImageError::Config(_))));
    }

    #[test]
    fn test_resize_rejects_extreme_aspect_ratio() {
        // 1x100000 would become 384x38400000 at paper width
        let img = create_test_image(1, 100_000);
        let result = resize_to_width(img, crate::PAPER_WIDTH, MAX_OUTPUT_HEIGHT);
        assert!(matches!(result, Err(ThermalImageError::InvalidInput(_))));
    }

    #[test]
    fn test_resize_height_limit_is_inclusive() {
        let img = create_test_image(100, 50);
        assert_eq!(resize_to_width(img.clone(), 200, 100).unwrap().dimensions(), (200, 100));
        assert!(resize_to_width(img, 200, 99).is_err());
    }

    #[test]
    fn test_height_limit_applies_at_target_width() {
        let img = create_test_image(384, 500);
        let result = resize_to_width(img, 384, 499);
        assert!(matches!(result, Err(ThermalImageError::InvalidInput(_))));
    }

    #[test]
    fn test_transparent_pixels_do_not_bleed_color() {
        // Transparent black on the left, opaque white on the right
        let mut pixels = Vec::new();
        for x in 0..8 {
            pixels.extend_from_slice(if x < 4 { &[0, 0, 0, 0] } else { &[255, 255, 255, 255] });
        }
        let img = RasterImage::new(8, 1, ChannelLayout::Rgba8, pixels).unwrap();
        let result = resize_to_width(img, 16, MAX_OUTPUT_HEIGHT).unwrap();

        assert_eq!(result.dimensions(), (16, 2));
        for px in result.pixels().chunks_exact(4) {
            if px[3] > 0 {
                assert_eq!(&px[..3], &[255, 255, 255], "{px:?}");
            }
        }
        assert_eq!(result.pixel(15, 0), &[255, 255, 255, 255]);
    }
}
