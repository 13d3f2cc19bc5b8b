//! Error types for the pdf2figures library.
//!
//! Two distinct error types reflect two distinct failure scopes:
//!
//! * [`FigureError`] is **fatal**: a whole-request operation cannot proceed
//!   (download failed, document unparseable, engine missing, bad config).
//!   Returned as `Err(FigureError)` from [`crate::rasterize()`] and from batch
//!   envelope parsing. A rasterization job has no partial-success mode.
//!
//! * [`CropFailure`] is **non-fatal**: a single crop request could not be
//!   honoured (corrupt payload, degenerate region). The batch assembler in
//!   [`crate::crop`] converts every `CropFailure` into a pass-through result
//!   so one bad entry never aborts its siblings.

use crate::geometry::PixelRect;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2figures library.
///
/// Per-image cropping failures use [`CropFailure`] and are never propagated
/// here.
#[derive(Debug, Error)]
pub enum FigureError {
    // ── Transport errors ──────────────────────────────────────────────────
    /// HTTP URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Local document was not found at the given path.
    #[error("Document not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The source string is neither a readable path nor an HTTP/HTTPS URL.
    #[error("Invalid document source '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// The bytes were fetched but do not start with a PDF header.
    #[error("Document '{source_name}' is not a PDF (first bytes: {magic:?})")]
    NotAPdf { source_name: String, magic: Vec<u8> },

    // ── Rasterization errors ──────────────────────────────────────────────
    /// Header/trailer/xref is corrupt and the engine cannot parse the document.
    #[error("Failed to parse PDF: {detail}")]
    CorruptPdf { detail: String },

    /// Document requires a password but none was provided.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// The engine failed on a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be encoded for transport.
    #[error("Failed to encode page {page}: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// The rasterization engine could not be loaded.
    #[error(
        "Rasterisation engine unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    EngineUnavailable(String),

    // ── Request errors ────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A crop batch envelope could not be parsed.
    #[error("Invalid crop request: {0}")]
    InvalidRequest(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FigureError {
    /// `true` for failures fetching the document (the TransportError class).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FigureError::DownloadFailed { .. } | FigureError::DownloadTimeout { .. }
        )
    }

    /// `true` for failures inside the rasterization engine.
    pub fn is_rasterization(&self) -> bool {
        matches!(
            self,
            FigureError::CorruptPdf { .. }
                | FigureError::PasswordRequired
                | FigureError::WrongPassword
                | FigureError::RasterisationFailed { .. }
                | FigureError::EncodeFailed { .. }
                | FigureError::EngineUnavailable(_)
                | FigureError::NotAPdf { .. }
        )
    }
}

/// A non-fatal failure for a single crop request.
///
/// The caller always receives the original encoded image back when one of
/// these occurs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CropFailure {
    /// The encoded payload is not valid base64 or not a decodable image.
    #[error("decode failed: {detail}")]
    Decode { detail: String },

    /// The bounding box has all four fields but at least one is not a number.
    #[error("malformed bounding box: {detail}")]
    MalformedBox { detail: String },

    /// Neither the padded nor the fallback rect fits the source image.
    #[error("region {rect} is not a valid crop of a {width}x{height} image")]
    InvalidRegion {
        rect: PixelRect,
        width: u32,
        height: u32,
    },

    /// The cropped bitmap could not be re-encoded.
    #[error("encode failed: {detail}")]
    Encode { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_timeout_display() {
        let e = FigureError::DownloadTimeout {
            url: "https://example.com/a.pdf".into(),
            secs: 30,
        };
        let msg = e.to_string();
        assert!(msg.contains("30s"), "got: {msg}");
        assert!(e.is_transport());
        assert!(!e.is_rasterization());
    }

    #[test]
    fn rasterisation_failed_display() {
        let e = FigureError::RasterisationFailed {
            page: 3,
            detail: "bad stream".into(),
        };
        assert!(e.to_string().contains("page 3"));
        assert!(e.is_rasterization());
    }

    #[test]
    fn not_a_pdf_is_rasterization() {
        let e = FigureError::NotAPdf {
            source_name: "x.bin".into(),
            magic: b"GIF8".to_vec(),
        };
        assert!(e.is_rasterization());
        assert!(e.to_string().contains("x.bin"));
    }

    #[test]
    fn invalid_region_display() {
        let e = CropFailure::InvalidRegion {
            rect: PixelRect {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            },
            width: 50,
            height: 40,
        };
        let msg = e.to_string();
        assert!(msg.contains("50x40"), "got: {msg}");
    }
}
