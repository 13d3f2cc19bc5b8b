//! PDF rasterisation: render the first N pages to `DynamicImage`.
//!
//! The engine sits behind [`RasterEngine`] so the rest of the pipeline never
//! touches pdfium directly. [`PdfiumEngine`] is the production
//! implementation; tests plug in synthetic engines.
//!
//! pdfium holds thread-local state and blocks for the whole render, so
//! [`render_pages`] runs the engine on the blocking pool.

use crate::config::RasterConfig;
use crate::error::FigureError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Parameters for one rasterization call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub dpi: u32,
    pub max_pages: usize,
    pub max_rendered_pixels: Option<u32>,
    pub password: Option<String>,
}

impl From<&RasterConfig> for RenderRequest {
    fn from(config: &RasterConfig) -> Self {
        Self {
            dpi: config.dpi,
            max_pages: config.max_pages,
            max_rendered_pixels: config.max_rendered_pixels,
            password: config.password.clone(),
        }
    }
}

/// A rasterization engine: document bytes in, ordered page bitmaps out.
///
/// Implementations must return page 1 at index 0 and stop after
/// `min(max_pages, page_count)` pages. Any failure aborts the whole call.
pub trait RasterEngine: Send + Sync {
    /// Short name used in logs and the `check` command.
    fn name(&self) -> &str;

    /// Verify the engine can run at all.
    fn probe(&self) -> Result<(), FigureError>;

    /// Rasterise the leading pages of `document`.
    fn rasterize(
        &self,
        document: &[u8],
        request: &RenderRequest,
    ) -> Result<Vec<DynamicImage>, FigureError>;
}

/// pdfium-backed engine.
///
/// Binds to the library at `PDFIUM_LIB_PATH` when set, then to a copy next
/// to the executable's working directory, then to the system library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    library_path: Option<PathBuf>,
}

impl PdfiumEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit library path instead of the lookup chain.
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, FigureError> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => Pdfium::bind_to_library(&path).map_err(|e| {
                FigureError::EngineUnavailable(format!("{}: {e}", path.display()))
            })?,
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| FigureError::EngineUnavailable(e.to_string()))?,
        };
        Ok(Pdfium::new(bindings))
    }
}

impl RasterEngine for PdfiumEngine {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn probe(&self) -> Result<(), FigureError> {
        self.bind().map(|_| ())
    }

    fn rasterize(
        &self,
        document: &[u8],
        request: &RenderRequest,
    ) -> Result<Vec<DynamicImage>, FigureError> {
        let pdfium = self.bind()?;
        let password = request.password.as_deref();

        let doc = pdfium
            .load_pdf_from_byte_slice(document, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        FigureError::WrongPassword
                    } else {
                        FigureError::PasswordRequired
                    }
                } else {
                    FigureError::CorruptPdf { detail: err_str }
                }
            })?;

        let pages = doc.pages();
        let total_pages = pages.len() as usize;
        let to_render = total_pages.min(request.max_pages);
        info!("PDF loaded: {} pages, rendering {}", total_pages, to_render);

        let scale = request.dpi as f32 / POINTS_PER_INCH;
        let mut render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        if let Some(cap) = request.max_rendered_pixels {
            let cap = pixel_cap(cap);
            render_config = render_config
                .set_maximum_width(cap)
                .set_maximum_height(cap);
        }

        let mut images = Vec::with_capacity(to_render);
        for idx in 0..to_render {
            let page = pages
                .get(idx as u16)
                .map_err(|e| FigureError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                FigureError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}

/// pdfium takes pixel limits as `i32`; saturate rather than wrap.
fn pixel_cap(px: u32) -> i32 {
    i32::try_from(px).unwrap_or(i32::MAX)
}

/// Resolve the engine for a job: the configured one, else pdfium.
pub fn resolve_engine(config: &RasterConfig) -> Arc<dyn RasterEngine> {
    match config.engine {
        Some(ref engine) => Arc::clone(engine),
        None => Arc::new(PdfiumEngine::new()),
    }
}

/// Rasterise the leading pages of `document` on the blocking pool.
///
/// Returns exactly `min(config.max_pages, page_count)` images in page order.
pub async fn render_pages(
    document: Vec<u8>,
    config: &RasterConfig,
) -> Result<Vec<DynamicImage>, FigureError> {
    let engine = resolve_engine(config);
    let request = RenderRequest::from(config);

    tokio::task::spawn_blocking(move || engine.rasterize(&document, &request))
        .await
        .map_err(|e| FigureError::Internal(format!("Render task panicked: {}", e)))?
}
