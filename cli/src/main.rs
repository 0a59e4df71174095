//! Command-line front end: convert image URLs into PBM bitmaps for a
//! thermal printer.
//!
//! Each URL is converted independently. A failure is reported and the run
//! continues with the next URL; the exit status is non-zero if any failed.

mod config;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use thermal_image::{DitherAlgorithm, PackedBitmap, PipelineOptions, process_url};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "pbm-fetch")]
#[command(about = "Fetch images and convert them to 1-bit PBM for thermal printers")]
struct Cli {
    /// Image URLs (http or https)
    #[arg(required = true)]
    urls: Vec<String>,

    /// Output width in pixels (printer paper width)
    #[arg(short, long)]
    width: Option<u32>,

    /// Dither algorithm: direct, floyd-steinberg or ordered
    #[arg(short, long)]
    algorithm: Option<DitherAlgorithm>,

    /// Brightness level, 128 = neutral
    #[arg(short, long)]
    brightness: Option<u8>,

    /// Keep transparent pixels as their color instead of white
    #[arg(long)]
    keep_alpha: bool,

    /// Fetch timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Output file for a single URL (default: stdout)
    #[arg(short, long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Directory receiving one numbered .pbm per URL
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration.
    fn pipeline_options(&self, config: &AppConfig) -> PipelineOptions {
        let mut opts = config.pipeline_options();
        if let Some(width) = self.width {
            opts = opts.with_target_width(width);
        }
        if let Some(algorithm) = self.algorithm {
            opts = opts.with_algorithm(algorithm);
        }
        if let Some(brightness) = self.brightness {
            opts = opts.with_brightness(brightness);
        }
        if self.keep_alpha {
            opts = opts.with_alpha_as_white(false);
        }
        if let Some(secs) = self.timeout_secs {
            opts = opts.with_timeout(Duration::from_secs(secs));
        }
        opts
    }
}

/// Where converted bitmaps are written.
enum Sink {
    Stdout,
    File(PathBuf),
    Dir(PathBuf),
}

impl Sink {
    fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        if let Some(dir) = &cli.output_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
            return Ok(Sink::Dir(dir.clone()));
        }
        match &cli.output {
            Some(_) if cli.urls.len() > 1 => {
                bail!("--output takes a single URL; use --output-dir for several")
            }
            Some(path) => Ok(Sink::File(path.clone())),
            None => Ok(Sink::Stdout),
        }
    }

    fn write(&self, index: usize, bitmap: &PackedBitmap) -> anyhow::Result<()> {
        match self {
            Sink::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(bitmap.as_bytes())?;
                stdout.flush()?;
            }
            Sink::File(path) => write_file(path, bitmap)?,
            Sink::Dir(dir) => write_file(&dir.join(format!("{index:03}.pbm")), bitmap)?,
        }
        Ok(())
    }
}

fn write_file(path: &Path, bitmap: &PackedBitmap) -> anyhow::Result<()> {
    std::fs::write(path, bitmap.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote PBM");
    Ok(())
}

/// Write one conversion result, logging any failure. Returns `true` on success.
fn deliver(
    sink: &Sink,
    index: usize,
    url: &str,
    result: thermal_image::Result<PackedBitmap>,
) -> bool {
    let bitmap = match result {
        Ok(bitmap) => bitmap,
        Err(e) => {
            tracing::error!(url = %url, "Failed to convert image: {e}");
            return false;
        }
    };
    if let Err(e) = sink.write(index, &bitmap) {
        tracing::error!(url = %url, "Failed to write PBM: {e:#}");
        return false;
    }
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays a clean PBM stream.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pbm_fetch=info,thermal_image=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    config::load_dotenv();
    let config = AppConfig::load()?;
    let opts = cli.pipeline_options(&config);
    let sink = Sink::from_cli(&cli)?;

    tracing::debug!(?opts, "Pipeline options resolved");

    let mut failures = 0usize;
    for (index, url) in cli.urls.iter().enumerate() {
        if !deliver(&sink, index, url, process_url(url, &opts).await) {
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{failures} of {} images failed", cli.urls.len());
    }
    Ok(())
}
