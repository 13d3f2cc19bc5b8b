//! Bounding-box to pixel-region resolution.
//!
//! Upstream vision models describe a figure as a [`BoundingBox`] in page
//! fractions. Those boxes are often slightly off, so the cropper first grows
//! the box by a small padding and clamps it to the image. If that padded
//! rect collapses (zero or negative extent) the raw box is used verbatim
//! instead. Whatever comes out is checked against [`PixelRect::is_within`]
//! before any pixels are touched.
//!
//! ```text
//!  step 1  padded:   x = max(0, ⌊(bx − p)·W⌋)      w = min(W − x, ⌊(bw + 2p)·W⌋)
//!                    y = max(0, ⌊(by − p)·H⌋)      h = min(H − y, ⌊(bh + 2p)·H⌋)
//!  step 2  fallback: x = ⌊bx·W⌋  y = ⌊by·H⌋  w = ⌊bw·W⌋  h = ⌊bh·H⌋   (if w ≤ 0 or h ≤ 0)
//! ```

use crate::error::CropFailure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A rectangle in normalised page-fraction coordinates.
///
/// Values are nominally in `[0, 1]` but nothing is enforced on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A rectangle in integer pixel units, `[x, x+width) × [y, y+height)`.
///
/// Signed so that an out-of-range fallback rect can be represented and
/// rejected rather than silently wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl PixelRect {
    /// Non-positive width or height.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Whether this rect is a non-empty sub-region of a `width × height` image.
    pub fn is_within(&self, width: u32, height: u32) -> bool {
        !self.is_degenerate()
            && self.x >= 0
            && self.y >= 0
            && self.x.saturating_add(self.width) <= i64::from(width)
            && self.y.saturating_add(self.height) <= i64::from(height)
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Which step of the algorithm produced the final rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectSource {
    /// Step 1: padded and clamped.
    Padded,
    /// Step 2: raw bbox, used because the padded rect was degenerate.
    Fallback,
}

/// A crop rect that satisfies the [`PixelRect`] invariant for its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub rect: PixelRect,
    pub source: RectSource,
}

/// `⌊v⌋` as a pixel count. Saturates at the `i64` range.
fn floor_px(v: f64) -> i64 {
    v.floor() as i64
}

/// Step 1: pad the box on every side and clamp it to the image.
///
/// For any `padding ≥ 0` the result never starts before the origin and never
/// extends past the right or bottom edge; it may however be degenerate.
pub fn padded_rect(bbox: &BoundingBox, width: u32, height: u32, padding: f64) -> PixelRect {
    let (w, h) = (f64::from(width), f64::from(height));
    let x = floor_px((bbox.x - padding) * w).max(0);
    let y = floor_px((bbox.y - padding) * h).max(0);
    let rw = (i64::from(width) - x).min(floor_px((bbox.width + 2.0 * padding) * w));
    let rh = (i64::from(height) - y).min(floor_px((bbox.height + 2.0 * padding) * h));
    PixelRect {
        x,
        y,
        width: rw,
        height: rh,
    }
}

/// Step 2: the raw box scaled to pixels, without padding or clamping.
pub fn fallback_rect(bbox: &BoundingBox, width: u32, height: u32) -> PixelRect {
    let (w, h) = (f64::from(width), f64::from(height));
    PixelRect {
        x: floor_px(bbox.x * w),
        y: floor_px(bbox.y * h),
        width: floor_px(bbox.width * w),
        height: floor_px(bbox.height * h),
    }
}

/// Resolve a bounding box to the pixel rect that should be cropped.
///
/// The fallback rect is taken as-is. With `padding >= 0` it is only reached
/// when the raw box is itself empty or entirely off the image along the
/// collapsed axis, so clamping it could never produce a usable region.
/// Returns [`CropFailure::InvalidRegion`] whenever the chosen rect violates
/// the bounds invariant; such a rect is never used to crop.
pub fn resolve_crop_rect(
    bbox: &BoundingBox,
    width: u32,
    height: u32,
    padding: f64,
) -> Result<Resolution, CropFailure> {
    let padded = padded_rect(bbox, width, height, padding);

    let (rect, source) = if padded.is_degenerate() {
        (fallback_rect(bbox, width, height), RectSource::Fallback)
    } else {
        (padded, RectSource::Padded)
    };

    if !rect.is_within(width, height) {
        return Err(CropFailure::InvalidRegion {
            rect,
            width,
            height,
        });
    }

    Ok(Resolution { rect, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAD: f64 = 0.005;

    #[test]
    fn concrete_scenario_matches_expected_rect() {
        let bbox = BoundingBox::new(0.1, 0.2, 0.3, 0.25);
        let res = resolve_crop_rect(&bbox, 1000, 2000, PAD).expect("valid region");
        assert_eq!(res.source, RectSource::Padded);
        assert_eq!(
            res.rect,
            PixelRect {
                x: 95,
                y: 390,
                width: 310,
                height: 520
            }
        );
    }

    #[test]
    fn padding_is_clamped_at_origin_and_far_edges() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let rect = padded_rect(&bbox, 200, 100, PAD);
        assert_eq!(
            rect,
            PixelRect {
                x: 0,
                y: 0,
                width: 200,
                height: 100
            }
        );
    }

    #[test]
    fn padded_rect_never_leaves_the_image() {
        let dims = [(1, 1), (7, 13), (99, 100), (640, 480), (1000, 2000)];
        let values = [-1.5, -0.2, 0.0, 0.004, 0.25, 0.5, 0.995, 1.0, 1.7];
        let paddings = [0.0, PAD, 0.1, 2.0];
        for &(w, h) in &dims {
            for &bx in &values {
                for &by in &values {
                    for &bw in &values {
                        for &bh in &values {
                            for &p in &paddings {
                                let r = padded_rect(&BoundingBox::new(bx, by, bw, bh), w, h, p);
                                assert!(r.x >= 0 && r.y >= 0, "{r} for {w}x{h}");
                                assert!(r.x + r.width <= i64::from(w), "{r} for {w}x{h}");
                                assert!(r.y + r.height <= i64::from(h), "{r} for {w}x{h}");
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn zero_box_on_small_image_falls_back_and_stays_degenerate() {
        let bbox = BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        let padded = padded_rect(&bbox, 50, 50, PAD);
        assert!(padded.width <= 0);

        assert_eq!(
            fallback_rect(&bbox, 50, 50),
            PixelRect {
                x: 0,
                y: 0,
                width: 0,
                height: 0
            }
        );

        let err = resolve_crop_rect(&bbox, 50, 50, PAD).unwrap_err();
        assert!(matches!(err, CropFailure::InvalidRegion { .. }));
    }

    #[test]
    fn fallback_is_used_when_padded_width_collapses() {
        // A box starting past the right edge clamps to w <= 0; the raw box
        // then overshoots the right edge and is rejected.
        let bbox = BoundingBox::new(1.2, 0.1, 0.3, 0.3);
        let err = resolve_crop_rect(&bbox, 100, 100, PAD).unwrap_err();
        match err {
            CropFailure::InvalidRegion { rect, .. } => {
                assert_eq!(rect.x, 120);
                assert_eq!(rect.width, 30);
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn valid_fallback_rect_is_used_verbatim() {
        // Negative padding shrinks the box until it collapses; the raw box
        // still fits and is cropped unpadded.
        let bbox = BoundingBox::new(0.5, 0.5, 0.25, 0.25);
        let res = resolve_crop_rect(&bbox, 100, 100, -0.2).expect("raw box fits");
        assert_eq!(res.source, RectSource::Fallback);
        assert_eq!(
            res.rect,
            PixelRect {
                x: 50,
                y: 50,
                width: 25,
                height: 25
            }
        );
    }

    #[test]
    fn fractions_outside_unit_range_are_not_rejected() {
        let bbox = BoundingBox::new(-0.5, -0.5, 2.0, 2.0);
        let res = resolve_crop_rect(&bbox, 100, 80, PAD).expect("clamped by step 1");
        assert_eq!(
            res.rect,
            PixelRect {
                x: 0,
                y: 0,
                width: 100,
                height: 80
            }
        );
    }

    #[test]
    fn is_within_rejects_each_violation() {
        let ok = PixelRect {
            x: 1,
            y: 1,
            width: 8,
            height: 8,
        };
        assert!(ok.is_within(10, 10));
        assert!(!PixelRect { x: -1, ..ok }.is_within(10, 10));
        assert!(!PixelRect { y: -1, ..ok }.is_within(10, 10));
        assert!(!PixelRect { width: 10, ..ok }.is_within(10, 10));
        assert!(!PixelRect { height: 10, ..ok }.is_within(10, 10));
        assert!(!PixelRect { width: 0, ..ok }.is_within(10, 10));
    }
}
