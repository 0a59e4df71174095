//! In-memory raster types passed between pipeline stages.
//!
//! [`RasterImage`] holds 8-bit pixels (RGBA or single-channel luma) from decode
//! through grayscale conversion. [`BilevelRaster`] holds the dithered 1-bit
//! result, one byte per pixel, until the packer serializes it.

use image::{DynamicImage, GrayImage, RgbaImage};

use crate::{Result, ThermalImageError};

/// Channel layout of a [`RasterImage`] pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    /// Red, green, blue, alpha; 4 bytes per pixel.
    Rgba8,
    /// Single luma channel; 1 byte per pixel.
    Gray8,
}

impl ChannelLayout {
    /// Number of bytes per pixel.
    pub const fn channels(self) -> usize {
        match self {
            ChannelLayout::Rgba8 => 4,
            ChannelLayout::Gray8 => 1,
        }
    }
}

/// An 8-bit raster with a declared channel layout.
///
/// Always non-empty, and `pixels.len() == width * height * channels`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Build a raster from a row-major pixel buffer.
    pub fn new(width: u32, height: u32, layout: ChannelLayout, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ThermalImageError::InvalidInput(format!(
                "raster dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * layout.channels();
        if pixels.len() != expected {
            return Err(ThermalImageError::InvalidInput(format!(
                "pixel buffer holds {} bytes, expected {expected} for {width}x{height} {layout:?}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            layout,
            pixels,
        })
    }

    /// Build a raster where every pixel has the same value.
    pub fn from_pixel(width: u32, height: u32, layout: ChannelLayout, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != layout.channels() {
            return Err(ThermalImageError::InvalidInput(format!(
                "pixel has {} channels, layout {layout:?} needs {}",
                pixel.len(),
                layout.channels()
            )));
        }
        let count = width as usize * height as usize;
        Self::new(width, height, layout, pixel.repeat(count))
    }

    /// Take ownership of a decoded image.
    ///
    /// Plain 8-bit luma stays single-channel; every other color type is
    /// normalized to RGBA so alpha survives until grayscale conversion.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        match img {
            DynamicImage::ImageLuma8(gray) => {
                Self::new(width, height, ChannelLayout::Gray8, gray.into_raw())
            }
            other => Self::new(width, height, ChannelLayout::Rgba8, other.into_rgba8().into_raw()),
        }
    }

    /// Copy into an `image` crate buffer for resampling.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let mismatch = || {
            ThermalImageError::InvalidInput(format!(
                "pixel buffer does not match {}x{} {:?}",
                self.width, self.height, self.layout
            ))
        };
        match self.layout {
            ChannelLayout::Gray8 => GrayImage::from_raw(self.width, self.height, self.pixels.clone())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(mismatch),
            ChannelLayout::Rgba8 => RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(mismatch),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Raw row-major pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Channel values of the pixel at `(x, y)`.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        let channels = self.layout.channels();
        let start = (y as usize * self.width as usize + x as usize) * channels;
        &self.pixels[start..start + channels]
    }
}

/// Meaning of a `1` value in a [`BilevelRaster`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// `1` = ink (black), `0` = paper (white). The PBM convention.
    #[default]
    InkIsOne,
    /// `1` = light (white), `0` = ink. Inverted by the packer.
    LightIsOne,
}

impl Polarity {
    /// Whether a stored value means ink under this polarity.
    pub const fn is_ink(self, value: u8) -> bool {
        match self {
            Polarity::InkIsOne => value != 0,
            Polarity::LightIsOne => value == 0,
        }
    }
}

/// A 1-bit raster, one byte (`0` or `1`) per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BilevelRaster {
    width: u32,
    height: u32,
    polarity: Polarity,
    bits: Vec<u8>,
}

impl BilevelRaster {
    /// Build a raster from one value per pixel. Non-zero values are stored as `1`.
    pub fn new(width: u32, height: u32, polarity: Polarity, bits: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ThermalImageError::InvalidInput(format!(
                "bilevel dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if bits.len() != expected {
            return Err(ThermalImageError::InvalidInput(format!(
                "bilevel buffer holds {} pixels, expected {expected}",
                bits.len()
            )));
        }
        let bits = bits.into_iter().map(|v| u8::from(v != 0)).collect();
        Ok(Self {
            width,
            height,
            polarity,
            bits,
        })
    }

    /// Internal constructor for buffers already known to be `width * height` of 0/1.
    pub(crate) fn from_ink_bits(width: u32, height: u32, bits: Vec<u8>) -> Self {
        debug_assert_eq!(bits.len(), width as usize * height as usize);
        Self {
            width,
            height,
            polarity: Polarity::InkIsOne,
            bits,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Stored values, row-major, interpreted according to [`Self::polarity`].
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Iterate over rows of stored values.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.bits.chunks(self.width as usize)
    }

    /// Whether the pixel at `(x, y)` is ink, regardless of polarity.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        let value = self.bits[y as usize * self.width as usize + x as usize];
        self.polarity.is_ink(value)
    }

    /// Number of ink pixels.
    pub fn ink_count(&self) -> usize {
        self.bits
            .iter()
            .filter(|&&v| self.polarity.is_ink(v))
            .count()
    }
}
