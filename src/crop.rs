//! Batch cropping: one result per request, in request order.
//!
//! Every request is independent. A failure on one entry (corrupt payload,
//! degenerate region) turns into a pass-through result for that entry only:
//! the original encoded string comes back unchanged and a warning is logged.
//! Nothing here returns an error for a single bad image.

use crate::config::CropConfig;
use crate::error::{CropFailure, FigureError};
use crate::output::{
    BboxInput, CropBatchRequest, CropBatchResponse, CropRequest, CropResult, RawCropItem,
};
use crate::pipeline::crop::crop_figure;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Parse a JSON batch envelope into validated requests.
///
/// Only a malformed envelope fails (invalid JSON, or `images` not an array).
/// Bad entries, payloads and bounding boxes are classified per entry and
/// handled during cropping.
pub fn parse_crop_batch(json: &str) -> Result<Vec<CropRequest>, FigureError> {
    let batch: CropBatchRequest =
        serde_json::from_str(json).map_err(|e| FigureError::InvalidRequest(e.to_string()))?;
    Ok(batch
        .images
        .into_iter()
        .map(|entry| CropRequest::from(RawCropItem::from(entry)))
        .collect())
}

/// Process a single request, never failing.
pub fn crop_one(request: &CropRequest, config: &CropConfig) -> CropResult {
    let outcome = match &request.bbox {
        BboxInput::Missing => {
            debug!("Image {}: no bounding box, passing through", request.index);
            return pass_through(request, false);
        }
        BboxInput::Malformed(detail) => Err(CropFailure::MalformedBox {
            detail: detail.clone(),
        }),
        BboxInput::Valid(bbox) => crop_figure(&request.encoded_image, bbox, config),
    };

    match outcome {
        Ok(cropped) => CropResult {
            index: request.index.clone(),
            encoded_image: cropped.encoded,
            cropped: true,
        },
        Err(failure) => {
            warn!(
                "Image {}: crop failed, returning original: {}",
                request.index, failure
            );
            pass_through(request, true)
        }
    }
}

fn pass_through(request: &CropRequest, attempted: bool) -> CropResult {
    CropResult {
        index: request.index.clone(),
        encoded_image: request.encoded_image.clone(),
        cropped: attempted,
    }
}

/// Crop a batch concurrently on the blocking pool.
///
/// Results come back in request order regardless of completion order.
pub async fn crop_batch(requests: Vec<CropRequest>, config: &CropConfig) -> Vec<CropResult> {
    let start = Instant::now();
    let total = requests.len();

    let results: Vec<CropResult> = stream::iter(requests.into_iter().map(|request| {
        let request = Arc::new(request);
        let worker = Arc::clone(&request);
        let cfg = config.clone();
        async move {
            match tokio::task::spawn_blocking(move || crop_one(&worker, &cfg)).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        "Image {}: crop task panicked, returning original: {}",
                        request.index, e
                    );
                    pass_through(&request, request.bbox.is_present())
                }
            }
        }
    }))
    .buffered(config.concurrency.max(1))
    .collect()
    .await;

    info!(
        "Cropped batch of {} images in {}ms",
        total,
        start.elapsed().as_millis()
    );
    results
}

/// Sequential batch cropping for callers without a runtime.
///
/// Observably identical to [`crop_batch`].
pub fn crop_batch_sync(requests: &[CropRequest], config: &CropConfig) -> Vec<CropResult> {
    requests.iter().map(|r| crop_one(r, config)).collect()
}

/// Parse a JSON envelope, crop every entry, and build the response.
pub async fn crop_batch_json(
    json: &str,
    config: &CropConfig,
) -> Result<CropBatchResponse, FigureError> {
    let requests = parse_crop_batch(json)?;
    Ok(CropBatchResponse::new(crop_batch(requests, config).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::pipeline::codec::encode_image;
    use image::{DynamicImage, Rgb, RgbImage};
    use serde_json::{json, Value};

    fn encoded(w: u32, h: u32) -> String {
        encode_image(&DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([9, 9, 9]))), 90)
            .unwrap()
    }

    #[test]
    fn missing_bbox_is_byte_identical_pass_through() {
        let src = encoded(20, 20);
        let req = CropRequest::new(7, src.clone(), None);
        let res = crop_one(&req, &CropConfig::default());
        assert!(!res.cropped);
        assert_eq!(res.encoded_image, src);
        assert_eq!(res.index, json!(7));
    }

    #[test]
    fn malformed_bbox_is_attempted_pass_through() {
        let src = encoded(20, 20);
        let req = CropRequest {
            index: json!(1),
            encoded_image: src.clone(),
            bbox: BboxInput::Malformed("field 'x' is not a number".into()),
        };
        let res = crop_one(&req, &CropConfig::default());
        assert!(res.cropped);
        assert_eq!(res.encoded_image, src);
    }

    #[test]
    fn valid_bbox_produces_new_image() {
        let src = encoded(100, 100);
        let req = CropRequest::new(0, src.clone(), Some(BoundingBox::new(0.2, 0.2, 0.5, 0.5)));
        let res = crop_one(&req, &CropConfig::default());
        assert!(res.cropped);
        assert_ne!(res.encoded_image, src);
    }

    #[test]
    fn parse_rejects_bad_envelope() {
        assert!(matches!(
            parse_crop_batch("not json"),
            Err(FigureError::InvalidRequest(_))
        ));
        assert!(parse_crop_batch(r#"{"images": "all"}"#).is_err());
        assert!(parse_crop_batch(r#"{"images": []}"#).unwrap().is_empty());
    }

    #[test]
    fn parse_keeps_entries_with_bad_payloads() {
        let reqs = parse_crop_batch(r#"{"images": [{"index": 0, "base64": 5}, 3]}"#).unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].index, json!(0));
        assert_eq!(reqs[0].encoded_image, "");
        assert_eq!(reqs[1].index, Value::Null);
    }

    #[test]
    fn empty_payload_with_bbox_is_attempted_pass_through() {
        let req = CropRequest::new(2, "", Some(BoundingBox::new(0.1, 0.1, 0.5, 0.5)));
        let res = crop_one(&req, &CropConfig::default());
        assert!(res.cropped);
        assert_eq!(res.encoded_image, "");
    }

    #[tokio::test]
    async fn batch_preserves_order_and_indices() {
        let reqs: Vec<CropRequest> = (0..8)
            .map(|i| {
                let bbox = (i % 2 == 0).then(|| BoundingBox::new(0.1, 0.1, 0.3, 0.3));
                CropRequest::new(i, encoded(60 + i as u32, 40), bbox)
            })
            .collect();
        let cfg = CropConfig::builder().concurrency(3).build().unwrap();
        let results = crop_batch(reqs, &cfg).await;
        let indices: Vec<_> = results.iter().map(|r| r.index.clone()).collect();
        assert_eq!(indices, (0..8).map(|i| json!(i)).collect::<Vec<_>>());
        for (i, r) in results.iter().enumerate() {
            assert_eq!(r.cropped, i % 2 == 0);
        }
    }
}
