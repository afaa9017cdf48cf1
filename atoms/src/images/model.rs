use serde::{Deserialize, Serialize};

/// Bounding box covering the whole 600x600 stage. Masks that arrive without
/// a box from the segmentation model default to this.
pub const FULL_CANVAS_BBOX: [f64; 4] = [0.0, 0.0, 600.0, 600.0];

fn default_bbox() -> [f64; 4] {
    FULL_CANVAS_BBOX
}

fn default_score() -> f64 {
    1.0
}

/// Image domain model - one generated coloring page. `uuid` is the external
/// identifier used in every URL and foreign reference; the store's internal
/// keys never leave the service layer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneratedImage {
    pub uuid: String,
    pub prompt: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masks: Option<Vec<Mask>>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// One segmentation region. Order inside the image's mask list is the index
/// that fills anchor to, so the list is never reordered in place.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Mask {
    #[serde(default = "default_bbox")]
    pub bbox: [f64; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<SegmentationData>,
    #[serde(default = "default_score")]
    pub score: f64,
}

impl Mask {
    /// The best-effort mask used when the model's payload carries nothing
    /// usable - one region covering the whole stage.
    pub fn full_canvas(mask_path: impl Into<String>) -> Self {
        Mask {
            bbox: FULL_CANVAS_BBOX,
            mask_path: Some(mask_path.into()),
            segmentation: None,
            score: 1.0,
        }
    }
}

/// Raw segmentation payload as returned by the model - a boolean grid or an
/// encoded string. Kept for diagnostics, never consumed by the render path.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum SegmentationData {
    Grid(Vec<Vec<bool>>),
    Encoded(String),
}

#[derive(Debug, Deserialize)]
pub struct CreateImagePayload {
    pub prompt: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub uuid: Option<String>,
}
