//! Image-to-PBM conversion for thermal printers.
//!
//! Fetches a remote image, resizes it to the paper width, flattens it to
//! grayscale with a brightness curve, dithers it to 1-bit, and packs the
//! result as binary PBM (`P4`) ready for a printer transport.

pub mod dither;
pub mod fetch;
pub mod grayscale;
pub mod options;
pub mod pbm;
pub mod pipeline;
pub mod raster;
pub mod resize;

// Re-exports for convenience
pub use dither::{DitherAlgorithm, dither};
pub use fetch::{FetchOptions, decode_image, fetch_image};
pub use grayscale::to_grayscale;
pub use options::PipelineOptions;
pub use pbm::{PackedBitmap, pack};
pub use pipeline::{process_bytes, process_image, process_url};
pub use raster::{BilevelRaster, ChannelLayout, Polarity, RasterImage};
pub use resize::{MAX_OUTPUT_HEIGHT, resize_to_width};

/// Standard thermal printer paper width in pixels.
pub const PAPER_WIDTH: u32 = 384;

/// Errors that can occur while turning an image into a PBM bitmap.
#[derive(Debug, thiserror::Error)]
pub enum ThermalImageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    SizeLimitExceeded { size: u64, limit: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type alias for thermal-image operations.
pub type Result<T> = std::result::Result<T, ThermalImageError>;
