//! CLI binary for pdf2figures.
//!
//! A thin shim over the library crate. Every command prints exactly one JSON
//! document on stdout: the success envelope, or `{"success": false, "error":
//! "..."}` with exit status 1. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf2figures::{
    crop_batch_json, engine_available, rasterize, CropConfig, EngineReport, FailureResponse,
    RasterConfig,
};
use serde::Serialize;
use std::io;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Rasterize the first 3 pages of a paper at 200 DPI
  pdf2fig rasterize https://arxiv.org/pdf/1706.03762 3 200

  # Same, from a local file, higher JPEG quality
  pdf2fig rasterize paper.pdf 5 150 92

  # Crop figures: JSON batch on stdin, JSON result on stdout
  echo '{"images":[{"index":0,"base64":"data:image/jpeg;base64,...",
         "bbox":{"x":0.1,"y":0.2,"width":0.3,"height":0.25}}]}' | pdf2fig crop

  # Check that the PDF engine can be loaded
  pdf2fig check

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  PDF2FIG_VERBOSE         Enable debug logs on stderr
  PDF2FIG_QUIET           Only log errors
  RUST_LOG                Full tracing filter override
"#;

/// Rasterize PDF pages and crop figures out of page images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2fig",
    version,
    about = "Rasterize PDF pages and crop figures out of page images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2FIG_VERBOSE")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, env = "PDF2FIG_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the first pages of a PDF to base64 JPEG images.
    Rasterize {
        /// Local PDF file path or HTTP/HTTPS URL.
        source: String,

        /// Render at most this many pages.
        #[arg(default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
        max_pages: u64,

        /// Rendering DPI (1–1200).
        #[arg(default_value_t = 150, value_parser = clap::value_parser!(u32).range(1..=1200))]
        dpi: u32,

        /// JPEG quality (1–100).
        #[arg(default_value_t = 85, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,

        /// HTTP download timeout in seconds.
        #[arg(long, env = "PDF2FIG_DOWNLOAD_TIMEOUT", default_value_t = 30)]
        download_timeout: u64,

        /// Number of pages encoded in parallel.
        #[arg(short, long, env = "PDF2FIG_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,

        /// Cap on the longest edge of a rendered page, in pixels.
        #[arg(long, env = "PDF2FIG_MAX_PIXELS")]
        max_pixels: Option<u32>,

        /// PDF user password for encrypted documents.
        #[arg(long, env = "PDF2FIG_PASSWORD")]
        password: Option<String>,
    },

    /// Crop figures out of page images. Reads a JSON batch from stdin.
    Crop {
        /// Margin added on every side, as a fraction of the image size.
        #[arg(long, env = "PDF2FIG_PADDING", default_value_t = 0.005)]
        padding: f64,

        /// JPEG quality for cropped output (1–100).
        #[arg(long, env = "PDF2FIG_CROP_QUALITY", default_value_t = 98,
              value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,

        /// Number of images cropped in parallel.
        #[arg(short, long, env = "PDF2FIG_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,
    },

    /// Report whether the PDF engine can be loaded.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => fail(err.to_string().trim()),
    };

    // ── Logging setup ────────────────────────────────────────────────────
    // stdout carries the JSON result only.
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run(cli.command).await {
        fail(format!("{err:#}"));
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Rasterize {
            source,
            max_pages,
            dpi,
            quality,
            download_timeout,
            concurrency,
            max_pixels,
            password,
        } => {
            let mut builder = RasterConfig::builder()
                .max_pages(usize::try_from(max_pages).unwrap_or(usize::MAX))
                .dpi(dpi)
                .quality(quality)
                .download_timeout_secs(download_timeout)
                .concurrency(concurrency);
            if let Some(px) = max_pixels {
                builder = builder.max_rendered_pixels(px);
            }
            if let Some(pw) = password {
                builder = builder.password(pw);
            }
            let config = builder.build()?;

            let output = rasterize(&source, &config).await?;
            emit(&output.into_response())
        }

        Command::Crop {
            padding,
            quality,
            concurrency,
        } => {
            let config = CropConfig::builder()
                .padding(padding)
                .quality(quality)
                .concurrency(concurrency)
                .build()?;

            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read crop batch from stdin")?;

            let response = crop_batch_json(&input, &config).await?;
            emit(&response)
        }

        Command::Check => {
            let engine = engine_available(&RasterConfig::default()).await?;
            emit(&EngineReport {
                success: true,
                engine,
            })
        }
    }
}

/// Print one JSON document on stdout.
fn emit<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}

/// Print the failure envelope and exit with status 1.
fn fail(error: impl std::fmt::Display) -> ! {
    let body = serde_json::to_string(&FailureResponse::new(error))
        .unwrap_or_else(|_| r#"{"success":false,"error":"unknown error"}"#.to_string());
    println!("{body}");
    std::process::exit(1);
}
