//! # pdf2figures
//!
//! Turn PDF pages into images and cut figures out of them.
//!
//! Two independent operations:
//!
//! * **Rasterize**: fetch a PDF by URL or path, render its first N pages at
//!   a chosen DPI and return each as a `data:image/jpeg;base64,` string.
//! * **Crop**: given page images and normalised bounding boxes (fractions
//!   of the image size, top-left origin), return tightly padded crops. A
//!   crop that cannot be honoured returns its source image unchanged.
//!
//! ## Pipeline Overview
//!
//! ```text
//! rasterize                          crop batch
//!  │                                  │
//!  ├─ 1. Input   URL or local path    ├─ 1. Parse   {"images": [...]}
//!  ├─ 2. Render  pdfium, first N      ├─ 2. Decode  headered or bare base64
//!  ├─ 3. Encode  JPEG → base64        ├─ 3. Crop    bbox → padded pixel rect
//!  └─ 4. Output  images + metadata    └─ 4. Encode  JPEG q98, or pass-through
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2figures::{crop_batch, rasterize, BoundingBox, CropConfig, CropRequest, RasterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pages = rasterize("paper.pdf", &RasterConfig::default()).await?;
//!
//!     let requests = vec![CropRequest::new(
//!         0,
//!         pages.images[0].clone(),
//!         Some(BoundingBox::new(0.1, 0.4, 0.3, 0.25)),
//!     )];
//!     let figures = crop_batch(requests, &CropConfig::default()).await;
//!     assert!(figures[0].cropped);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2fig` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod crop;
pub mod error;
pub mod geometry;
pub mod output;
pub mod pipeline;
pub mod rasterize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{CropConfig, CropConfigBuilder, RasterConfig, RasterConfigBuilder};
pub use crop::{crop_batch, crop_batch_json, crop_batch_sync, crop_one, parse_crop_batch};
pub use error::{CropFailure, FigureError};
pub use geometry::{resolve_crop_rect, BoundingBox, PixelRect, RectSource};
pub use output::{
    BboxInput, CropBatchResponse, CropRequest, CropResult, EngineReport, FailureResponse,
    RasterMetadata, RasterResponse,
};
pub use pipeline::render::{PdfiumEngine, RasterEngine, RenderRequest};
pub use rasterize::{
    engine_available, rasterize, rasterize_bytes, rasterize_pages, rasterize_sync, RasterOutput,
    RasterStats,
};
