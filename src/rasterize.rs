//! Rasterization entry points: a document in, headered JPEG page images out.
//!
//! A rasterization job is all-or-nothing. A failure anywhere (fetch, parse,
//! render, encode) aborts the job with a [`FigureError`]; no partial list is
//! ever returned.

use crate::config::RasterConfig;
use crate::error::FigureError;
use crate::output::{RasterMetadata, RasterResponse};
use crate::pipeline::codec::encode_image;
use crate::pipeline::{input, render};
use futures::stream::{self, StreamExt, TryStreamExt};
use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, info};

/// Source name recorded in metadata for in-memory documents.
const BYTES_SOURCE: &str = "<bytes>";

/// Timing for one rasterization job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RasterStats {
    pub fetch_duration_ms: u64,
    pub render_duration_ms: u64,
    pub encode_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of a rasterization job.
#[derive(Debug, Clone)]
pub struct RasterOutput {
    /// `data:image/jpeg;base64,` strings, page 1 first.
    pub images: Vec<String>,
    pub metadata: RasterMetadata,
    pub stats: RasterStats,
}

impl RasterOutput {
    /// Convert into the JSON success envelope.
    pub fn into_response(self) -> RasterResponse {
        RasterResponse {
            success: true,
            images: self.images,
            metadata: self.metadata,
        }
    }
}

/// Rasterize the leading pages of a PDF named by URL or local path.
///
/// # Errors
/// Transport failures, a non-PDF payload, engine failures and encode
/// failures are all fatal for the job.
///
/// # Example
/// ```rust,no_run
/// use pdf2figures::{rasterize, RasterConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RasterConfig::builder().max_pages(2).build()?;
/// let output = rasterize("https://example.com/paper.pdf", &config).await?;
/// assert!(output.images.len() <= 2);
/// # Ok(())
/// # }
/// ```
pub async fn rasterize(
    source: impl AsRef<str>,
    config: &RasterConfig,
) -> Result<RasterOutput, FigureError> {
    let total_start = Instant::now();
    let source = source.as_ref();
    info!("Starting rasterization: {}", source);

    // ── Step 1: Fetch ────────────────────────────────────────────────────
    let fetch_start = Instant::now();
    let document = input::resolve_source(source, config.download_timeout_secs).await?;
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;

    let mut output = rasterize_document(document.bytes, source, config).await?;
    output.stats.fetch_duration_ms = fetch_duration_ms;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    log_completion(&output);
    Ok(output)
}

/// Rasterize an in-memory PDF.
///
/// The `%PDF` check still applies; metadata records the source as `<bytes>`.
pub async fn rasterize_bytes(
    bytes: Vec<u8>,
    config: &RasterConfig,
) -> Result<RasterOutput, FigureError> {
    let total_start = Instant::now();
    input::check_pdf_magic(BYTES_SOURCE, &bytes)?;
    let mut output = rasterize_document(bytes, BYTES_SOURCE, config).await?;
    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    log_completion(&output);
    Ok(output)
}

/// Synchronous wrapper around [`rasterize`].
///
/// Creates a temporary tokio runtime internally.
pub fn rasterize_sync(
    source: impl AsRef<str>,
    config: &RasterConfig,
) -> Result<RasterOutput, FigureError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| FigureError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(rasterize(source, config))
}

/// Render page bitmaps without encoding them.
///
/// Returns exactly `min(max_pages, page_count)` images, page 1 first.
pub async fn rasterize_pages(
    bytes: Vec<u8>,
    config: &RasterConfig,
) -> Result<Vec<DynamicImage>, FigureError> {
    render::render_pages(bytes, config).await
}

/// Check that the configured engine can be bound. Returns its name.
pub async fn engine_available(config: &RasterConfig) -> Result<String, FigureError> {
    let engine = render::resolve_engine(config);
    tokio::task::spawn_blocking(move || engine.probe().map(|_| engine.name().to_string()))
        .await
        .map_err(|e| FigureError::Internal(format!("Probe task panicked: {}", e)))?
}

/// Encode page bitmaps as headered JPEG strings, preserving order.
///
/// Up to `concurrency` pages are encoded at once on the blocking pool.
pub async fn encode_pages(
    pages: Vec<DynamicImage>,
    quality: u8,
    concurrency: usize,
) -> Result<Vec<String>, FigureError> {
    stream::iter(pages.into_iter().enumerate().map(|(idx, page)| async move {
        tokio::task::spawn_blocking(move || {
            encode_image(&page, quality).map_err(|e| FigureError::EncodeFailed {
                page: idx + 1,
                detail: e.to_string(),
            })
        })
        .await
        .map_err(|e| FigureError::Internal(format!("Encode task panicked: {}", e)))?
    }))
    .buffered(concurrency.max(1))
    .try_collect()
    .await
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn log_completion(output: &RasterOutput) {
    let s = &output.stats;
    info!(
        "Rasterized {} pages of {} at {} DPI in {}ms (fetch {}ms, render {}ms, encode {}ms)",
        output.metadata.page_count,
        output.metadata.pdf_url,
        output.metadata.dpi,
        s.total_duration_ms,
        s.fetch_duration_ms,
        s.render_duration_ms,
        s.encode_duration_ms
    );
}

async fn rasterize_document(
    bytes: Vec<u8>,
    source: &str,
    config: &RasterConfig,
) -> Result<RasterOutput, FigureError> {
    // ── Step 2: Render ───────────────────────────────────────────────────
    let render_start = Instant::now();
    let pages = render::render_pages(bytes, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    debug!("Rendered {} pages in {}ms", pages.len(), render_duration_ms);

    // ── Step 3: Encode ───────────────────────────────────────────────────
    let encode_start = Instant::now();
    let images = encode_pages(pages, config.quality, config.concurrency).await?;
    let encode_duration_ms = encode_start.elapsed().as_millis() as u64;

    let metadata = RasterMetadata {
        pdf_url: source.to_string(),
        page_count: images.len(),
        dpi: config.dpi,
        quality: config.quality,
    };

    Ok(RasterOutput {
        images,
        metadata,
        stats: RasterStats {
            render_duration_ms,
            encode_duration_ms,
            ..RasterStats::default()
        },
    })
}
