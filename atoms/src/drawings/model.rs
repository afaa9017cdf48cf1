use serde::{Deserialize, Serialize};

/// One continuous freehand stroke: alternating x,y coordinates with a fixed
/// color and width. Points are appended while the pointer is down; a new
/// stroke starts on every pointer-down.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Stroke {
    pub points: Vec<f64>,
    pub stroke: String,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: f64,
}

fn fallback_mask_index() -> i32 {
    -1
}

/// One fill action. `mask_index >= 0` anchors the fill to a segmentation
/// mask; `-1` is a free circle at (x, y) with an explicit radius. Drawings
/// saved before masks existed carry fills with no `maskIndex` at all - the
/// default hydrates those as circle fills.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Fill {
    #[serde(rename = "maskIndex", default = "fallback_mask_index")]
    pub mask_index: i32,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

/// Drawing domain model - the single saved drawing for one image
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Drawing {
    #[serde(rename = "imageId")]
    pub image_id: String,
    pub lines: Vec<Stroke>,
    pub fills: Vec<Fill>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveDrawingPayload {
    #[serde(rename = "imageId")]
    pub image_id: Option<String>,
    pub lines: Option<Vec<Stroke>>,
    pub fills: Option<Vec<Fill>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_fill_without_mask_index_hydrates_as_circle_fill() {
        let fill: Fill =
            serde_json::from_str(r##"{"x": 120.0, "y": 80.0, "color": "#ff0000"}"##).unwrap();
        assert_eq!(fill.mask_index, -1);
        assert_eq!(fill.x, Some(120.0));
        assert_eq!(fill.y, Some(80.0));
        assert_eq!(fill.radius, None);
    }

    #[test]
    fn mask_fill_round_trips_without_point_fields() {
        let fill = Fill {
            mask_index: 3,
            color: "#00ff00".to_string(),
            x: None,
            y: None,
            radius: None,
        };
        let json = serde_json::to_string(&fill).unwrap();
        assert_eq!(json, r##"{"maskIndex":3,"color":"#00ff00"}"##);
        let back: Fill = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fill);
    }

    #[test]
    fn stroke_uses_the_wire_field_names() {
        let stroke = Stroke {
            points: vec![1.0, 2.0, 3.0, 4.0],
            stroke: "#000000".to_string(),
            stroke_width: 5.0,
        };
        let json = serde_json::to_value(&stroke).unwrap();
        assert_eq!(json["strokeWidth"], 5.0);
        assert_eq!(json["points"][2], 3.0);
    }
}
