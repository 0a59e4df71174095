//! Grayscale conversion with transparency flattening and a brightness curve.

use tracing::debug;

use crate::Result;
use crate::raster::{ChannelLayout, RasterImage};

/// Brightness level that leaves luma untouched.
pub const NEUTRAL_BRIGHTNESS: u8 = 128;

/// Composite one channel value over opaque white with the given alpha.
fn composite_over_white(channel: u8, alpha: u8) -> u8 {
    let a = f64::from(alpha) / 255.0;
    let out = f64::from(channel) * a + 255.0 * (1.0 - a);
    out.round().clamp(0.0, 255.0) as u8
}

/// BT.601 luma, rounded to nearest.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    y.round().clamp(0.0, 255.0) as u8
}

/// Signed adjustment the brightness curve adds to luma `m`.
///
/// Zero at `m = 0` and `m = 255` for every brightness, and zero everywhere at
/// [`NEUTRAL_BRIGHTNESS`]. Strongest in the midtones.
pub fn brightness_factor(brightness: u8, m: u8) -> f64 {
    let m = f64::from(m) / 255.0;
    (f64::from(brightness) - f64::from(NEUTRAL_BRIGHTNESS)) * (1.0 - m) * m * 2.0
}

/// Apply the brightness curve to a single luma value.
pub fn apply_brightness(m: u8, brightness: u8) -> u8 {
    let out = f64::from(m) + brightness_factor(brightness, m);
    // Truncates toward zero after clamping, like an integer point transform.
    out.clamp(0.0, 255.0) as u8
}

/// Convert a raster to single-channel luma.
///
/// With `alpha_as_white`, RGBA pixels are first composited over opaque white so
/// transparent regions print as paper. Without it the alpha channel is ignored.
/// A non-neutral `brightness` then lifts (above 128) or darkens (below 128)
/// the midtones.
pub fn to_grayscale(img: &RasterImage, brightness: u8, alpha_as_white: bool) -> Result<RasterImage> {
    let (width, height) = img.dimensions();
    debug!(
        width,
        height,
        brightness,
        alpha_as_white,
        layout = ?img.layout(),
        "Converting image to grayscale"
    );

    let mut gray: Vec<u8> = match img.layout() {
        ChannelLayout::Gray8 => img.pixels().to_vec(),
        ChannelLayout::Rgba8 => img
            .pixels()
            .chunks_exact(4)
            .map(|px| {
                let (r, g, b, a) = (px[0], px[1], px[2], px[3]);
                if alpha_as_white {
                    luma(
                        composite_over_white(r, a),
                        composite_over_white(g, a),
                        composite_over_white(b, a),
                    )
                } else {
                    luma(r, g, b)
                }
            })
            .collect(),
    };

    if brightness != NEUTRAL_BRIGHTNESS {
        // Only 256 possible inputs, so build the lookup table once.
        let table: Vec<u8> = (0..=255u8).map(|m| apply_brightness(m, brightness)).collect();
        for v in &mut gray {
            *v = table[*v as usize];
        }
    }

    RasterImage::new(width, height, ChannelLayout::Gray8, gray)
}
