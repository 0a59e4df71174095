//! End-to-end conversion: fetch → resize → grayscale → dither → pack.
//!
//! Stages run strictly in order over data owned by the request. Any failure
//! aborts the request; nothing is emitted until packing succeeds.

use tracing::info;

use crate::Result;
use crate::dither::dither;
use crate::fetch::{decode_image, fetch_image};
use crate::grayscale::to_grayscale;
use crate::options::PipelineOptions;
use crate::pbm::{PackedBitmap, pack};
use crate::raster::RasterImage;
use crate::resize::resize_to_width;

/// Run every stage after acquisition on an already-decoded raster.
pub fn process_image(img: RasterImage, opts: &PipelineOptions) -> Result<PackedBitmap> {
    let resized = resize_to_width(img, opts.target_width, opts.max_height)?;
    let gray = to_grayscale(&resized, opts.brightness, opts.alpha_as_white)?;
    let bilevel = dither(&gray, opts.algorithm)?;
    Ok(pack(&bilevel))
}

/// Decode an in-memory payload and convert it.
pub fn process_bytes(bytes: &[u8], opts: &PipelineOptions) -> Result<PackedBitmap> {
    let img = decode_image(bytes)?;
    process_image(img, opts)
}

/// Fetch an image over http(s) and convert it to a P4 bitmap.
pub async fn process_url(url: &str, opts: &PipelineOptions) -> Result<PackedBitmap> {
    let img = fetch_image(url, &opts.fetch).await?;
    let packed = process_image(img, opts)?;
    info!(
        url,
        width = packed.width(),
        height = packed.height(),
        algorithm = %opts.algorithm,
        bytes = packed.as_bytes().len(),
        "Converted image to PBM"
    );
    Ok(packed)
}
