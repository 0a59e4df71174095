//! Dithering algorithms for converting grayscale images to 1-bit.
//!
//! Three strategies, selected through [`DitherAlgorithm`]:
//! - Direct threshold at 128
//! - Floyd-Steinberg error diffusion
//! - Ordered (4x4 Bayer) halftone
//!
//! Every algorithm returns a [`BilevelRaster`] with `1 = ink`.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::raster::{BilevelRaster, ChannelLayout, RasterImage};
use crate::{Result, ThermalImageError};

/// Binarization threshold. Values at or above it are paper (white).
const THRESHOLD: u8 = 128;

/// 4x4 Bayer index matrix, indexed as `ORDERED_MATRIX[x % 4][y % 4]`.
const ORDERED_MATRIX: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

/// Thresholds derived from [`ORDERED_MATRIX`] as `16 * i + 8`, spanning 8..=248.
///
/// The half-step offset keeps pure black (0) always inked and pure white (255)
/// never inked.
const ORDERED_THRESHOLDS: [[u8; 4]; 4] = {
    let mut out = [[0u8; 4]; 4];
    let mut i = 0;
    while i < 4 {
        let mut j = 0;
        while j < 4 {
            out[i][j] = ORDERED_MATRIX[i][j] * 16 + 8;
            j += 1;
        }
        i += 1;
    }
    out
};

/// Selectable dithering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherAlgorithm {
    /// Fixed threshold, no error carried between pixels.
    Direct,
    /// Error diffusion in raster order.
    #[default]
    FloydSteinberg,
    /// Fixed 4x4 threshold matrix tiled over the image.
    Ordered,
}

impl DitherAlgorithm {
    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            DitherAlgorithm::Direct => "direct",
            DitherAlgorithm::FloydSteinberg => "floyd-steinberg",
            DitherAlgorithm::Ordered => "ordered",
        }
    }
}

impl fmt::Display for DitherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DitherAlgorithm {
    type Err = ThermalImageError;

    /// Accepts canonical names plus the `algo-*` selectors used by web clients.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "threshold" | "algo-direct" => Ok(DitherAlgorithm::Direct),
            "floyd-steinberg" | "floydsteinberg" | "steinberg" | "algo-steinberg" => {
                Ok(DitherAlgorithm::FloydSteinberg)
            }
            "ordered" | "halftone" | "algo-halftone" => Ok(DitherAlgorithm::Ordered),
            other => Err(ThermalImageError::Config(format!(
                "unknown dither algorithm '{other}' (expected direct, floyd-steinberg or ordered)"
            ))),
        }
    }
}

/// Reduce a single-channel raster to 1-bit with the selected algorithm.
pub fn dither(gray: &RasterImage, algorithm: DitherAlgorithm) -> Result<BilevelRaster> {
    if gray.layout() != ChannelLayout::Gray8 {
        return Err(ThermalImageError::Config(format!(
            "dithering needs a Gray8 raster, got {:?}",
            gray.layout()
        )));
    }
    let (width, height) = gray.dimensions();
    debug!(width, height, %algorithm, "Applying dithering");

    let bits = match algorithm {
        DitherAlgorithm::Direct => threshold_bits(gray.pixels()),
        DitherAlgorithm::FloydSteinberg => floyd_steinberg_bits(gray.pixels(), width as usize),
        DitherAlgorithm::Ordered => ordered_bits(gray.pixels(), width as usize),
    };

    let raster = BilevelRaster::from_ink_bits(width, height, bits);
    debug!(ink = raster.ink_count(), "Dithering complete");
    Ok(raster)
}

fn threshold_bits(pixels: &[u8]) -> Vec<u8> {
    pixels.iter().map(|&v| u8::from(v < THRESHOLD)).collect()
}

/// Floyd-Steinberg over a row-major buffer.
///
/// Error distribution pattern:
/// - Right:        7/16
/// - Bottom-left:  3/16
/// - Bottom:       5/16
/// - Bottom-right: 1/16
///
/// Error state lives in two row accumulators owned by this call. Each is
/// `width + 2` wide so index `x + 1` addresses column `x` and the guard cells
/// at both ends absorb shares that fall outside the image. Guards are reset
/// every row, so those shares are dropped.
fn floyd_steinberg_bits(pixels: &[u8], width: usize) -> Vec<u8> {
    let mut current = vec![0i32; width + 2];
    let mut next = vec![0i32; width + 2];
    let mut bits = Vec::with_capacity(pixels.len());

    for row in pixels.chunks_exact(width) {
        for (x, &px) in row.iter().enumerate() {
            let old_pixel = i32::from(px) + current[x + 1];
            let new_pixel = if old_pixel >= i32::from(THRESHOLD) { 255 } else { 0 };
            bits.push(u8::from(new_pixel == 0));

            let error = old_pixel - new_pixel;
            current[x + 2] += error * 7 / 16;
            next[x] += error * 3 / 16;
            next[x + 1] += error * 5 / 16;
            next[x + 2] += error / 16;
        }

        std::mem::swap(&mut current, &mut next);
        next.fill(0);
        // Shares pushed past the left or right edge are discarded.
        current[0] = 0;
        current[width + 1] = 0;
    }

    bits
}

fn ordered_bits(pixels: &[u8], width: usize) -> Vec<u8> {
    pixels
        .chunks_exact(width)
        .enumerate()
        .flat_map(|(y, row)| {
            row.iter().enumerate().map(move |(x, &v)| {
                let threshold = ORDERED_THRESHOLDS[x % 4][y % 4];
                u8::from(v < threshold)
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a small test image with a gradient pattern.
    fn create_gradient_image(width: u32, height: u32) -> RasterImage {
        let mut pixels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(((x + y) * 255 / (width + height - 2)) as u8);
            }
        }
        RasterImage::new(width, height, ChannelLayout::Gray8, pixels).unwrap()
    }

    fn flat(width: u32, height: u32, value: u8) -> RasterImage {
        RasterImage::from_pixel(width, height, ChannelLayout::Gray8, &[value]).unwrap()
    }

    const ALL: [DitherAlgorithm; 3] = [
        DitherAlgorithm::Direct,
        DitherAlgorithm::FloydSteinberg,
        DitherAlgorithm::Ordered,
    ];

    #[test]
    fn test_output_is_binary_and_preserves_dimensions() {
        let img = create_gradient_image(10, 5);
        for algorithm in ALL {
            let result = dither(&img, algorithm).unwrap();
            assert_eq!(result.dimensions(), (10, 5));
            assert!(result.bits().iter().all(|&v| v <= 1), "{algorithm}");
        }
    }

    #[test]
    fn test_all_white_input_has_no_ink() {
        let img = flat(9, 4, 255);
        for algorithm in ALL {
            assert_eq!(dither(&img, algorithm).unwrap().ink_count(), 0, "{algorithm}");
        }
    }

    #[test]
    fn test_all_black_input_is_all_ink() {
        let img = flat(9, 4, 0);
        for algorithm in ALL {
            assert_eq!(dither(&img, algorithm).unwrap().ink_count(), 36, "{algorithm}");
        }
    }

    #[test]
    fn test_rejects_rgba_input() {
        let img = RasterImage::from_pixel(2, 2, ChannelLayout::Rgba8, &[0, 0, 0, 255]).unwrap();
        let result = dither(&img, DitherAlgorithm::Direct);
        assert!(matches!(result, Err(ThermalImageError::Config(_))));
    }

    #[test]
    fn test_direct_threshold_boundary() {
        let img = RasterImage::new(4, 1, ChannelLayout::Gray8, vec![0, 127, 128, 255]).unwrap();
        let result = dither(&img, DitherAlgorithm::Direct).unwrap();
        assert_eq!(result.bits(), &[1, 1, 0, 0]);
    }

    #[test]
    fn test_floyd_steinberg_known_row() {
        // 100 -> ink, error 100; next = 150 + 43 = 193 -> paper, error -62;
        // next = 200 - 27 = 173 -> paper.
        let img = RasterImage::new(3, 1, ChannelLayout::Gray8, vec![100, 150, 200]).unwrap();
        let result = dither(&img, DitherAlgorithm::FloydSteinberg).unwrap();
        assert_eq!(result.bits(), &[1, 0, 0]);
    }

    #[test]
    fn test_floyd_steinberg_diffuses_to_next_row() {
        // Top pixel 100 becomes ink and pushes 100 * 5/16 = 31 down, so the
        // 100 below reaches 131 and becomes paper.
        let img = RasterImage::new(1, 2, ChannelLayout::Gray8, vec![100, 100]).unwrap();
        let result = dither(&img, DitherAlgorithm::FloydSteinberg).unwrap();
        assert_eq!(result.bits(), &[1, 0]);

        let direct = dither(&img, DitherAlgorithm::Direct).unwrap();
        assert_eq!(direct.bits(), &[1, 1]);
    }

    #[test]
    fn test_floyd_steinberg_drops_error_past_right_edge() {
        let img = RasterImage::new(2, 2, ChannelLayout::Gray8, vec![255, 120, 127, 255]).unwrap();
        let result = dither(&img, DitherAlgorithm::FloydSteinberg).unwrap();
        // Row 0: 255 -> paper (err 0); 120 -> ink (err 120).
        // Row 1 col 0 receives 120 * 3/16 = 22 -> 149 -> paper, err -106;
        // col 1 gets 37 from above and -46 from the left -> 246 -> paper.
        assert_eq!(result.bits(), &[0, 1, 0, 0]);
    }

    #[test]
    fn test_floyd_steinberg_mid_gray_is_roughly_half_ink() {
        let img = flat(32, 32, 128);
        let ink = dither(&img, DitherAlgorithm::FloydSteinberg).unwrap().ink_count();
        assert!((400..=624).contains(&ink), "ink = {ink}");
    }

    #[test]
    fn test_ordered_thresholds_are_scaled_matrix() {
        assert_eq!(ORDERED_THRESHOLDS[0][0], 8);
        assert_eq!(ORDERED_THRESHOLDS[3][0], 248);
        let mut all: Vec<u8> = ORDERED_THRESHOLDS.iter().flatten().copied().collect();
        all.sort_unstable();
        let expected: Vec<u8> = (0..16).map(|i| i * 16 + 8).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_ordered_mid_gray_is_exactly_half_ink() {
        let img = flat(8, 8, 128);
        let result = dither(&img, DitherAlgorithm::Ordered).unwrap();
        assert_eq!(result.ink_count(), 32);
    }

    #[test]
    fn test_ordered_pattern_tiles_every_four_pixels() {
        let img = flat(8, 8, 100);
        let result = dither(&img, DitherAlgorithm::Ordered).unwrap();
        for y in 0..8 {
            for x in 0..4 {
                assert_eq!(result.is_ink(x, y), result.is_ink(x + 4, y));
            }
        }
        for x in 0..8 {
            for y in 0..4 {
                assert_eq!(result.is_ink(x, y), result.is_ink(x, y + 4));
            }
        }
    }

    #[test]
    fn test_ordered_is_deterministic() {
        let img = create_gradient_image(16, 16);
        let a = dither(&img, DitherAlgorithm::Ordered).unwrap();
        let b = dither(&img, DitherAlgorithm::Ordered).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_algorithm_names_parse() {
        assert_eq!("direct".parse::<DitherAlgorithm>().unwrap(), DitherAlgorithm::Direct);
        assert_eq!(
            "algo-steinberg".parse::<DitherAlgorithm>().unwrap(),
            DitherAlgorithm::FloydSteinberg
        );
        assert_eq!("Halftone".parse::<DitherAlgorithm>().unwrap(), DitherAlgorithm::Ordered);
        assert!("bayer8".parse::<DitherAlgorithm>().is_err());
        assert_eq!(DitherAlgorithm::default(), DitherAlgorithm::FloydSteinberg);
    }
}
