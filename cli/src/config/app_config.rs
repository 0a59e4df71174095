//! Runtime configuration loaded from the environment.

use std::time::Duration;

use anyhow::{Context, bail};
use thermal_image::{DitherAlgorithm, PipelineOptions};

use super::validation::{SETTING_KEYS, validate_setting};

/// Conversion defaults, overridable per run from the command line.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub print_width: u32,
    pub dither_algorithm: DitherAlgorithm,
    pub brightness: u8,
    pub alpha_as_white: bool,
    pub fetch_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let opts = PipelineOptions::default();
        Self {
            print_width: opts.target_width,
            dither_algorithm: opts.algorithm,
            brightness: opts.brightness,
            alpha_as_white: opts.alpha_as_white,
            fetch_timeout_secs: opts.fetch.timeout.as_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn load() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset or empty keys keep their defaults; set keys must validate.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let mut config = Self::default();

        for &key in SETTING_KEYS {
            let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let value = value.trim();
            if let Err(msg) = validate_setting(key, value) {
                bail!("invalid {key}={value:?}: {msg}");
            }

            match key {
                "PRINT_WIDTH" => config.print_width = value.parse().context("PRINT_WIDTH")?,
                "DITHER_ALGORITHM" => config.dither_algorithm = value.parse()?,
                "BRIGHTNESS" => config.brightness = value.parse().context("BRIGHTNESS")?,
                "ALPHA_AS_WHITE" => config.alpha_as_white = value == "true",
                "FETCH_TIMEOUT_SECS" => {
                    config.fetch_timeout_secs = value.parse().context("FETCH_TIMEOUT_SECS")?
                }
                _ => {}
            }
        }

        Ok(config)
    }

    /// Build pipeline options from this configuration.
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::new()
            .with_target_width(self.print_width)
            .with_algorithm(self.dither_algorithm)
            .with_brightness(self.brightness)
            .with_alpha_as_white(self.alpha_as_white)
            .with_timeout(Duration::from_secs(self.fetch_timeout_secs))
    }
}
