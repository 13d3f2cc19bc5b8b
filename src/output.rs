//! Wire types for the JSON request/response envelopes.
//!
//! Crop batches arrive as `{"images": [...]}` and leave as
//! `{"success": true, "croppedImages": [...]}`; rasterization leaves as
//! `{"success": true, "images": [...], "metadata": {...}}`. Any fatal error
//! becomes `{"success": false, "error": "..."}`.

use crate::geometry::BoundingBox;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four keys a bounding box must carry.
const BBOX_KEYS: [&str; 4] = ["x", "y", "width", "height"];

// ── Crop batch: input ────────────────────────────────────────────────────

/// A crop batch as received on the wire.
///
/// Only the envelope is typed here. Entries stay raw JSON so one malformed
/// entry is handled on its own instead of failing the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CropBatchRequest {
    #[serde(default)]
    pub images: Vec<Value>,
}

/// One batch entry before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCropItem {
    pub index: Value,
    pub base64: Option<Value>,
    pub bbox: Option<Value>,
}

impl From<Value> for RawCropItem {
    /// Non-object entries become an entry with no payload and no bbox.
    fn from(entry: Value) -> Self {
        match entry {
            Value::Object(mut map) => Self {
                index: map.remove("index").unwrap_or(Value::Null),
                base64: map.remove("base64"),
                bbox: map.remove("bbox"),
            },
            _ => Self::default(),
        }
    }
}

/// The bounding-box field of a request after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum BboxInput {
    /// Absent, `null`, empty, or missing one of the four keys. No crop.
    Missing,
    /// All four keys present but at least one is not a number. The crop is
    /// attempted and fails.
    Malformed(String),
    Valid(BoundingBox),
}

impl BboxInput {
    /// Classify a raw JSON bbox once, at the boundary.
    pub fn classify(raw: Option<&Value>) -> BboxInput {
        let obj = match raw {
            Some(Value::Object(map)) if !map.is_empty() => map,
            _ => return BboxInput::Missing,
        };
        if !BBOX_KEYS.iter().all(|k| obj.contains_key(*k)) {
            return BboxInput::Missing;
        }

        let mut vals = [0.0f64; 4];
        for (slot, key) in vals.iter_mut().zip(BBOX_KEYS) {
            match obj[key].as_f64() {
                Some(v) => *slot = v,
                None => {
                    return BboxInput::Malformed(format!(
                        "field '{key}' is not a number: {}",
                        obj[key]
                    ))
                }
            }
        }
        BboxInput::Valid(BoundingBox::new(vals[0], vals[1], vals[2], vals[3]))
    }

    /// Whether a crop will be attempted for this input.
    pub fn is_present(&self) -> bool {
        !matches!(self, BboxInput::Missing)
    }
}

/// A validated crop request.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRequest {
    /// Opaque correlation token, echoed back unchanged.
    pub index: Value,
    /// Headered or bare base64 image.
    pub encoded_image: String,
    pub bbox: BboxInput,
}

impl CropRequest {
    pub fn new(
        index: impl Into<Value>,
        encoded_image: impl Into<String>,
        bbox: Option<BoundingBox>,
    ) -> Self {
        Self {
            index: index.into(),
            encoded_image: encoded_image.into(),
            bbox: bbox.map_or(BboxInput::Missing, BboxInput::Valid),
        }
    }
}

impl From<RawCropItem> for CropRequest {
    /// A missing or non-string payload becomes an empty string, which fails
    /// to decode and passes through like any other corrupt image.
    fn from(raw: RawCropItem) -> Self {
        let bbox = BboxInput::classify(raw.bbox.as_ref());
        let encoded_image = match raw.base64 {
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        Self {
            index: raw.index,
            encoded_image,
            bbox,
        }
    }
}

// ── Crop batch: output ───────────────────────────────────────────────────

/// One batch entry in the response.
///
/// `cropped` is `true` whenever a bbox was present and a crop attempted,
/// even if it degraded to returning the source unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropResult {
    pub index: Value,
    #[serde(rename = "base64")]
    pub encoded_image: String,
    pub cropped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropBatchResponse {
    pub success: bool,
    #[serde(rename = "croppedImages")]
    pub cropped_images: Vec<CropResult>,
}

impl CropBatchResponse {
    pub fn new(cropped_images: Vec<CropResult>) -> Self {
        Self {
            success: true,
            cropped_images,
        }
    }
}

// ── Rasterization: output ────────────────────────────────────────────────

/// Parameters echoed back with a rasterization result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterMetadata {
    pub pdf_url: String,
    /// Number of images produced (not the document's total page count).
    pub page_count: usize,
    pub dpi: u32,
    pub quality: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterResponse {
    pub success: bool,
    pub images: Vec<String>,
    pub metadata: RasterMetadata,
}

// ── Shared ───────────────────────────────────────────────────────────────

/// Engine availability report for the `check` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReport {
    pub success: bool,
    pub engine: String,
}

/// Envelope for any fatal failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
}

impl FailureResponse {
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_missing_variants() {
        assert_eq!(BboxInput::classify(None), BboxInput::Missing);
        assert_eq!(BboxInput::classify(Some(&Value::Null)), BboxInput::Missing);
        assert_eq!(BboxInput::classify(Some(&json!({}))), BboxInput::Missing);
        assert_eq!(
            BboxInput::classify(Some(&json!({"x": 0.1, "y": 0.1, "width": 0.5}))),
            BboxInput::Missing
        );
        assert_eq!(BboxInput::classify(Some(&json!([1, 2, 3, 4]))), BboxInput::Missing);
    }

    #[test]
    fn classify_valid_accepts_integers() {
        let b = BboxInput::classify(Some(&json!({"x": 0, "y": 0.25, "width": 1, "height": 0.5})));
        assert_eq!(b, BboxInput::Valid(BoundingBox::new(0.0, 0.25, 1.0, 0.5)));
    }

    #[test]
    fn classify_non_numeric_is_malformed() {
        let b = BboxInput::classify(Some(&json!({"x": "0.1", "y": 0, "width": 1, "height": null})));
        match b {
            BboxInput::Malformed(msg) => assert!(msg.contains("'x'"), "got: {msg}"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(BboxInput::Malformed(String::new()).is_present());
    }

    #[test]
    fn raw_item_defaults() {
        let req: CropBatchRequest = serde_json::from_value(json!({"images": [{}]})).unwrap();
        let item = CropRequest::from(RawCropItem::from(req.images[0].clone()));
        assert_eq!(item.index, Value::Null);
        assert_eq!(item.encoded_image, "");
        assert_eq!(item.bbox, BboxInput::Missing);

        let empty: CropBatchRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.images.is_empty());
    }

    #[test]
    fn non_string_payload_becomes_empty() {
        for payload in [Value::Null, json!(42), json!(["a"]), json!({"data": "x"})] {
            let raw = RawCropItem::from(json!({
                "index": 1,
                "base64": payload,
                "bbox": {"x": 0.1, "y": 0.1, "width": 0.5, "height": 0.5},
            }));
            let item = CropRequest::from(raw);
            assert_eq!(item.encoded_image, "");
            assert_eq!(item.index, json!(1));
            assert!(item.bbox.is_present());
        }
    }

    #[test]
    fn non_object_entry_is_empty_item() {
        assert_eq!(RawCropItem::from(json!(7)), RawCropItem::default());
        assert_eq!(RawCropItem::from(json!("data:...")), RawCropItem::default());
    }

    #[test]
    fn response_field_names() {
        let resp = CropBatchResponse::new(vec![CropResult {
            index: json!(3),
            encoded_image: "abc".into(),
            cropped: false,
        }]);
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            v,
            json!({"success": true, "croppedImages": [{"index": 3, "base64": "abc", "cropped": false}]})
        );

        let meta = RasterMetadata {
            pdf_url: "u".into(),
            page_count: 2,
            dpi: 150,
            quality: 85,
        };
        let v = serde_json::to_value(&meta).unwrap();
        assert_eq!(v, json!({"pdfUrl": "u", "pageCount": 2, "dpi": 150, "quality": 85}));

        let v = serde_json::to_value(FailureResponse::new("boom")).unwrap();
        assert_eq!(v, json!({"success": false, "error": "boom"}));
    }
}
