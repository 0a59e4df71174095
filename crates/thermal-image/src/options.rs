//! Per-request pipeline options.

use std::time::Duration;

use crate::PAPER_WIDTH;
use crate::dither::DitherAlgorithm;
use crate::fetch::FetchOptions;
use crate::grayscale::NEUTRAL_BRIGHTNESS;
use crate::resize::MAX_OUTPUT_HEIGHT;

/// Configuration for one image-to-PBM conversion.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Output width in pixels (the printer's paper width).
    pub target_width: u32,

    /// Largest accepted output height in rows after resizing.
    pub max_height: u32,

    /// Dithering strategy used to reach 1-bit.
    pub algorithm: DitherAlgorithm,

    /// Brightness curve level, 128 = neutral.
    pub brightness: u8,

    /// Composite transparent pixels over white before grayscale conversion.
    pub alpha_as_white: bool,

    /// Limits applied to the remote fetch.
    pub fetch: FetchOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            target_width: PAPER_WIDTH,
            max_height: MAX_OUTPUT_HEIGHT,
            algorithm: DitherAlgorithm::default(),
            brightness: NEUTRAL_BRIGHTNESS,
            alpha_as_white: true,
            fetch: FetchOptions::default(),
        }
    }
}

impl PipelineOptions {
    /// Create options with printer defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set target width.
    pub fn with_target_width(mut self, val: u32) -> Self {
        self.target_width = val;
        self
    }

    /// Builder: set maximum output height.
    pub fn with_max_height(mut self, val: u32) -> Self {
        self.max_height = val;
        self
    }

    /// Builder: set dither algorithm.
    pub fn with_algorithm(mut self, val: DitherAlgorithm) -> Self {
        self.algorithm = val;
        self
    }

    /// Builder: set brightness level.
    pub fn with_brightness(mut self, val: u8) -> Self {
        self.brightness = val;
        self
    }

    /// Builder: set alpha-as-white flag.
    pub fn with_alpha_as_white(mut self, val: bool) -> Self {
        self.alpha_as_white = val;
        self
    }

    /// Builder: set fetch timeout.
    pub fn with_timeout(mut self, val: Duration) -> Self {
        self.fetch.timeout = val;
        self
    }

    /// Builder: set maximum payload size in bytes.
    pub fn with_max_bytes(mut self, val: u64) -> Self {
        self.fetch.max_bytes = val;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = PipelineOptions::default();
        assert_eq!(opts.target_width, 384);
        assert_eq!(opts.max_height, 16_384);
        assert_eq!(opts.algorithm, DitherAlgorithm::FloydSteinberg);
        assert_eq!(opts.brightness, 128);
        assert!(opts.alpha_as_white);
        assert_eq!(opts.fetch.timeout, Duration::from_secs(10));
        assert_eq!(opts.fetch.max_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_builder_chain() {
        let opts = PipelineOptions::new()
            .with_target_width(576)
            .with_max_height(2000)
            .with_algorithm(DitherAlgorithm::Ordered)
            .with_brightness(160)
            .with_alpha_as_white(false)
            .with_timeout(Duration::from_secs(3))
            .with_max_bytes(1024);

        assert_eq!(opts.target_width, 576);
        assert_eq!(opts.max_height, 2000);
        assert_eq!(opts.algorithm, DitherAlgorithm::Ordered);
        assert_eq!(opts.brightness, 160);
        assert!(!opts.alpha_as_white);
        assert_eq!(opts.fetch.timeout, Duration::from_secs(3));
        assert_eq!(opts.fetch.max_bytes, 1024);
    }
}
