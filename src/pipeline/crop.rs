//! Figure cropping: decode a page image, resolve the bounding box to pixels,
//! cut the region out and re-encode it.
//!
//! Every failure is returned as a [`CropFailure`]; the batch assembler in
//! [`crate::crop`] decides what to send back to the caller.

use crate::config::CropConfig;
use crate::error::CropFailure;
use crate::geometry::{resolve_crop_rect, BoundingBox, PixelRect, RectSource};
use crate::pipeline::codec::{decode_image, encode_image};
use image::DynamicImage;
use tracing::debug;

/// A successfully cropped figure.
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedImage {
    /// Headered base64 JPEG of the cropped region.
    pub encoded: String,
    /// The region that was cut, in source pixels.
    pub rect: PixelRect,
    pub source: RectSource,
    /// Source image dimensions.
    pub source_width: u32,
    pub source_height: u32,
}

/// Crop an already decoded bitmap.
///
/// The returned image owns its pixels; nothing outside `rect` is retained.
pub fn crop_bitmap(
    img: &DynamicImage,
    bbox: &BoundingBox,
    padding: f64,
) -> Result<(DynamicImage, PixelRect, RectSource), CropFailure> {
    let (width, height) = (img.width(), img.height());
    let res = resolve_crop_rect(bbox, width, height, padding)?;
    let r = res.rect;
    // `resolve_crop_rect` guarantees 0 <= x, x + w <= width (same for y),
    // so these casts are lossless.
    let cropped = img.crop_imm(r.x as u32, r.y as u32, r.width as u32, r.height as u32);
    Ok((cropped, r, res.source))
}

/// Crop the figure described by `bbox` out of an encoded page image.
pub fn crop_figure(
    encoded: &str,
    bbox: &BoundingBox,
    config: &CropConfig,
) -> Result<CroppedImage, CropFailure> {
    let img = decode_image(encoded)?;
    let (source_width, source_height) = (img.width(), img.height());

    let (cropped, rect, source) = crop_bitmap(&img, bbox, config.padding)?;
    drop(img);

    let encoded = encode_image(&cropped, config.quality).map_err(|e| CropFailure::Encode {
        detail: e.to_string(),
    })?;

    debug!(
        "Cropped {:?} rect {} from {}x{} px → {} bytes",
        source,
        rect,
        source_width,
        source_height,
        encoded.len()
    );

    Ok(CroppedImage {
        encoded,
        rect,
        source,
        source_width,
        source_height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    #[test]
    fn crop_bitmap_cuts_expected_pixels() {
        let img = page(200, 100);
        let bbox = BoundingBox::new(0.25, 0.5, 0.5, 0.25);
        let (cropped, rect, source) = crop_bitmap(&img, &bbox, 0.0).unwrap();
        assert_eq!(source, RectSource::Padded);
        assert_eq!((rect.x, rect.y), (50, 50));
        assert_eq!((cropped.width(), cropped.height()), (100, 25));
        // Top-left pixel of the crop is source pixel (50, 50).
        assert_eq!(cropped.to_rgb8().get_pixel(0, 0), &Rgb([50, 50, 128]));
    }

    #[test]
    fn crop_figure_reports_padded_rect_and_dimensions() {
        let encoded = encode_image(&page(400, 300), 90).unwrap();
        let bbox = BoundingBox::new(0.1, 0.1, 0.5, 0.5);
        let out = crop_figure(&encoded, &bbox, &CropConfig::default()).unwrap();

        assert_eq!((out.source_width, out.source_height), (400, 300));
        // x = ⌊0.095·400⌋ = 38, w = ⌊0.51·400⌋ = 204
        assert_eq!(out.rect.x, 38);
        assert_eq!(out.rect.width, 204);

        let back = decode_image(&out.encoded).unwrap();
        assert_eq!(
            (i64::from(back.width()), i64::from(back.height())),
            (out.rect.width, out.rect.height)
        );
    }

    #[test]
    fn degenerate_region_is_a_failure() {
        let encoded = encode_image(&page(50, 50), 90).unwrap();
        let bbox = BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        let err = crop_figure(&encoded, &bbox, &CropConfig::default()).unwrap_err();
        assert!(matches!(err, CropFailure::InvalidRegion { .. }));
    }

    #[test]
    fn corrupt_payload_is_a_decode_failure() {
        let bbox = BoundingBox::new(0.1, 0.1, 0.5, 0.5);
        let err = crop_figure("data:image/jpeg;base64,@@@@", &bbox, &CropConfig::default())
            .unwrap_err();
        assert!(matches!(err, CropFailure::Decode { .. }));
    }
}
