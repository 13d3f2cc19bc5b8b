//! Image codec: `DynamicImage` ↔ headered base64 JPEG string.
//!
//! Callers hand images around as data URIs (`data:image/jpeg;base64,…`)
//! or as bare base64. Decoding accepts both; encoding always emits the
//! headered form, always JPEG at the caller's quality.

use crate::error::CropFailure;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Header prepended to every encoded image.
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Strip an embedded media-type header, if any.
///
/// A header is anything before the first `,` in a string starting with
/// `data:`. Bare payloads are returned unchanged.
pub fn strip_header(encoded: &str) -> Result<&str, CropFailure> {
    if !encoded.starts_with("data:") {
        return Ok(encoded);
    }
    encoded
        .split_once(',')
        .map(|(_, payload)| payload)
        .ok_or_else(|| CropFailure::Decode {
            detail: "data URI has no ',' separator".into(),
        })
}

/// Decode a headered or bare base64 image.
pub fn decode_image(encoded: &str) -> Result<DynamicImage, CropFailure> {
    let payload = strip_header(encoded)?.trim();
    if payload.is_empty() {
        return Err(CropFailure::Decode {
            detail: "empty payload".into(),
        });
    }
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| CropFailure::Decode {
            detail: format!("invalid base64: {e}"),
        })?;
    let img = image::load_from_memory(&bytes).map_err(|e| CropFailure::Decode {
        detail: format!("unreadable image: {e}"),
    })?;
    debug!(
        "Decoded {} bytes → {}x{} px",
        bytes.len(),
        img.width(),
        img.height()
    );
    Ok(img)
}

/// Encode an image as JPEG at `quality` (1–100), returning the raw bytes.
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
/// Output is deterministic for identical input and quality.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;
    Ok(buf)
}

/// Encode an image as a headered base64 JPEG string.
pub fn encode_image(img: &DynamicImage, quality: u8) -> Result<String, image::ImageError> {
    let jpeg = encode_jpeg(img, quality)?;
    let b64 = STANDARD.encode(&jpeg);
    debug!(
        "Encoded {}x{} px at q{} → {} bytes base64",
        img.width(),
        img.height(),
        quality,
        b64.len()
    );
    Ok(format!("{JPEG_DATA_URI_PREFIX}{b64}"))
}
