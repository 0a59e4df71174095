//! Remote image download with validation, and payload decoding.
//!
//! A fetch is a single GET with a bounded timeout. The declared content type
//! and length are checked before the body is read, and the body is read
//! chunk by chunk against the size cap, so an oversized payload is rejected
//! before a decode buffer is ever built.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use tracing::{debug, warn};
use url::Url;

use crate::raster::RasterImage;
use crate::{Result, ThermalImageError};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum payload size (10 MiB).
pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Limits applied to a single image download.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Total time allowed for connect, headers and body.
    pub timeout: Duration,

    /// Maximum accepted payload size in bytes.
    pub max_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }
}

/// Parse a URL and reject anything other than http/https.
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ThermalImageError::InvalidInput(format!("invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ThermalImageError::InvalidInput(format!(
            "URL scheme must be http or https, got '{other}'"
        ))),
    }
}

fn network_error(e: reqwest::Error) -> ThermalImageError {
    if e.is_timeout() {
        ThermalImageError::Network(format!("request timed out: {e}"))
    } else {
        ThermalImageError::Network(e.to_string())
    }
}

fn enforce_limit(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(ThermalImageError::SizeLimitExceeded { size, limit });
    }
    Ok(())
}

/// Reject a response whose declared `Content-Type` is not an image.
fn check_content_type(headers: &HeaderMap) -> Result<()> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.trim_start().to_ascii_lowercase().starts_with("image/") {
        return Err(ThermalImageError::InvalidInput(format!(
            "invalid Content-Type: '{content_type}'"
        )));
    }
    Ok(())
}

/// Reject a response whose declared `Content-Length` exceeds the limit.
///
/// A missing or unparsable header passes; the body read enforces the cap.
fn check_declared_length(headers: &HeaderMap, limit: u64) -> Result<()> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());
    match declared {
        Some(size) => enforce_limit(size, limit),
        None => Ok(()),
    }
}

/// Download an image and decode it.
///
/// # Errors
/// - `InvalidInput` for a non-http(s) URL or a non-image content type
/// - `Network` for connection failures, timeouts and non-success statuses
/// - `SizeLimitExceeded` when the declared or received size passes `max_bytes`
/// - `Decode` when the payload is not a supported image
pub async fn fetch_image(url: &str, opts: &FetchOptions) -> Result<RasterImage> {
    let url = validate_url(url)?;
    debug!(%url, timeout = ?opts.timeout, max_bytes = opts.max_bytes, "Fetching image");

    let client = Client::builder()
        .timeout(opts.timeout)
        .build()
        .map_err(network_error)?;
    let mut resp = client.get(url.clone()).send().await.map_err(network_error)?;

    let status = resp.status();
    if !status.is_success() {
        return Err(ThermalImageError::Network(format!(
            "{url} returned status {status}"
        )));
    }

    if let Err(e) = check_content_type(resp.headers())
        .and_then(|()| check_declared_length(resp.headers(), opts.max_bytes))
    {
        warn!(%url, "Rejected image response: {e}");
        return Err(e);
    }

    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await.map_err(network_error)? {
        let received = (body.len() + chunk.len()) as u64;
        if let Err(e) = enforce_limit(received, opts.max_bytes) {
            warn!(%url, received, "Image body exceeded size limit");
            return Err(e);
        }
        body.extend_from_slice(&chunk);
    }
    debug!(%url, bytes = body.len(), "Image downloaded");

    decode_image(&body)
}

/// Decode an in-memory image payload; the format is sniffed from the bytes.
pub fn decode_image(bytes: &[u8]) -> Result<RasterImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ThermalImageError::Decode(e.to_string()))?;
    debug!(
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "Decoded image"
    );
    RasterImage::from_dynamic(img)
}
