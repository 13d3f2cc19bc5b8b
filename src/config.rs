//! Configuration types for rasterization jobs and crop batches.
//!
//! Every knob lives in one of two structs, [`RasterConfig`] and
//! [`CropConfig`], each built through a builder that validates on `build()`.
//! Both are cheap to clone and carry no state between requests.

use crate::error::FigureError;
use crate::pipeline::render::RasterEngine;
use std::fmt;
use std::sync::Arc;

/// Configuration for rasterizing a document into page images.
///
/// # Example
/// ```rust
/// use pdf2figures::RasterConfig;
///
/// let config = RasterConfig::builder()
///     .dpi(200)
///     .max_pages(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.quality, 85);
/// ```
#[derive(Clone)]
pub struct RasterConfig {
    /// Rendering resolution in dots per inch. Range: 1–1200. Default: 150.
    pub dpi: u32,

    /// Render at most this many pages, starting at page 1. Default: 5.
    pub max_pages: usize,

    /// JPEG quality for the encoded page images. Range: 1–100. Default: 85.
    pub quality: u8,

    /// Number of pages encoded in parallel. Default: 4.
    ///
    /// Rendering itself is serialised through the engine; only the
    /// per-page JPEG encode fans out.
    pub concurrency: usize,

    /// Download timeout for URL sources in seconds. Default: 30.
    pub download_timeout_secs: u64,

    /// Optional cap on the longest edge of a rendered page, in pixels.
    ///
    /// An A0 poster at 150 DPI is roughly 7000 × 9900 px. Leave `None` to
    /// honour `dpi` exactly.
    pub max_rendered_pixels: Option<u32>,

    /// User password for encrypted documents.
    pub password: Option<String>,

    /// Pre-constructed engine. When `None` the pdfium engine is bound on
    /// demand.
    pub engine: Option<Arc<dyn RasterEngine>>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_pages: 5,
            quality: 85,
            concurrency: 4,
            download_timeout_secs: 30,
            max_rendered_pixels: None,
            password: None,
            engine: None,
        }
    }
}

impl fmt::Debug for RasterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterConfig")
            .field("dpi", &self.dpi)
            .field("max_pages", &self.max_pages)
            .field("quality", &self.quality)
            .field("concurrency", &self.concurrency)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

impl RasterConfig {
    /// Create a new builder for `RasterConfig`.
    pub fn builder() -> RasterConfigBuilder {
        RasterConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RasterConfig`].
#[derive(Debug)]
pub struct RasterConfigBuilder {
    config: RasterConfig,
}

impl RasterConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n;
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = Some(px.max(16));
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn RasterEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RasterConfig, FigureError> {
        let c = &self.config;
        if c.dpi == 0 || c.dpi > 1200 {
            return Err(FigureError::InvalidConfig(format!(
                "DPI must be 1–1200, got {}",
                c.dpi
            )));
        }
        if c.max_pages == 0 {
            return Err(FigureError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        validate_quality(c.quality)?;
        Ok(self.config)
    }
}

/// Configuration for cropping figures out of page images.
#[derive(Debug, Clone, PartialEq)]
pub struct CropConfig {
    /// Extra margin added on every side, as a fraction of the image
    /// dimension. Default: 0.005.
    pub padding: f64,

    /// JPEG quality for the cropped output. Range: 1–100. Default: 98.
    pub quality: u8,

    /// Number of crop requests processed at once. Default: 4.
    pub concurrency: usize,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            padding: 0.005,
            quality: 98,
            concurrency: 4,
        }
    }
}

impl CropConfig {
    /// Create a new builder for `CropConfig`.
    pub fn builder() -> CropConfigBuilder {
        CropConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`CropConfig`].
#[derive(Debug)]
pub struct CropConfigBuilder {
    config: CropConfig,
}

impl CropConfigBuilder {
    /// Negative or NaN padding is treated as zero.
    pub fn padding(mut self, padding: f64) -> Self {
        self.config.padding = padding.max(0.0);
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<CropConfig, FigureError> {
        validate_quality(self.config.quality)?;
        if !self.config.padding.is_finite() {
            return Err(FigureError::InvalidConfig(
                "padding must be finite".into(),
            ));
        }
        Ok(self.config)
    }
}

fn validate_quality(q: u8) -> Result<(), FigureError> {
    if q == 0 || q > 100 {
        return Err(FigureError::InvalidConfig(format!(
            "JPEG quality must be 1–100, got {q}"
        )));
    }
    Ok(())
}
