use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use colorbook_atoms::images::model::{Mask, SegmentationData, FULL_CANVAS_BBOX};
use colorbook_atoms::images::service as images;

use crate::replicate::ReplicateClient;
use crate::{json_response, AppState};

/// Pinned SAM-2 automatic mask generator.
const MODEL_VERSION: &str = "meta/sam-2:fe97b453a6455861e3bac769b441ca1f1086110da7466dbb65cf1eecfd60dc83";

#[derive(Debug, Deserialize)]
struct SegmentPayload {
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
    #[serde(rename = "imageId")]
    image_id: Option<String>,
}

/// HTTP Handler: POST /segment
pub async fn segment_handler(
    state: Arc<AppState>,
    table_name: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: SegmentPayload = serde_json::from_slice(body)?;

    let Some(image_url) = payload.image_url.filter(|url| !url.is_empty()) else {
        return json_response(
            StatusCode::BAD_REQUEST,
            json!({"error": "imageUrl is required"}),
        );
    };

    match run_segmentation(&state, table_name, &image_url, payload.image_id.as_deref()).await {
        Ok(masks) => json_response(
            StatusCode::OK,
            json!({
                "success": true,
                "masks": masks,
            }),
        ),
        Err(e) => {
            tracing::error!("Error processing image with SAM: {}", e);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": format!("Failed to process image: {}", e)}),
            )
        }
    }
}

/// Segment one image and, when an image id was supplied, attach the
/// normalized masks to its record. Called inline by POST /segment and as
/// the background task the generation path spawns. One attempt only - a
/// failure here propagates and the image stays usable without masks.
pub async fn run_segmentation(
    state: &AppState,
    table_name: &str,
    image_url: &str,
    image_id: Option<&str>,
) -> Result<Vec<Mask>, String> {
    let token = ReplicateClient::token_from_env()
        .ok_or_else(|| "Replicate API token is not configured".to_string())?;
    let replicate = ReplicateClient::new(state.http_client.clone(), token);

    tracing::info!("Processing image with Segment Anything Model: {}", image_url);

    let input = json!({
        "image": image_url,
        "use_m2m": true,
        "points_per_side": 32,
        "pred_iou_thresh": 0.88,
        "stability_score_thresh": 0.95,
    });
    let output = replicate.run(MODEL_VERSION, input).await?;

    let masks = normalize_masks(&output);
    tracing::info!("Processed {} masks", masks.len());

    if let Some(image_id) = image_id {
        images::set_masks(&state.dynamo_client, table_name, image_id, &masks).await?;
        tracing::info!("✅ Updated image {} with masks in database", image_id);
    }

    Ok(masks)
}

/// Normalize a segmentation payload into a uniform mask list. Total and
/// never empty: shapes the walk can't use still produce one full-canvas
/// mask, so fill mode always has a region to anchor to.
pub fn normalize_masks(output: &Value) -> Vec<Mask> {
    let mut masks = Vec::new();

    match output {
        // a URL to a rendered mask image - one pseudo-mask over the whole
        // canvas referencing it
        Value::String(url) => masks.push(Mask::full_canvas(url.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if item.is_object() {
                    masks.push(mask_from_item(item, index));
                }
            }
        }
        Value::Object(map) => {
            if let Some(Value::Array(nested)) = map.get("masks") {
                for (index, item) in nested.iter().enumerate() {
                    masks.push(mask_from_item(item, index));
                }
            } else {
                masks.push(Mask::full_canvas(urls_reference(map)));
            }
        }
        _ => {}
    }

    if masks.is_empty() {
        masks.push(Mask::full_canvas("unknown"));
    }

    masks
}

fn mask_from_item(item: &Value, index: usize) -> Mask {
    Mask {
        bbox: item
            .get("bbox")
            .or_else(|| item.get("box"))
            .and_then(bbox_from_value)
            .unwrap_or(FULL_CANVAS_BBOX),
        mask_path: Some(
            item.get("mask_path")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("mask-{}", index)),
        ),
        segmentation: item
            .get("segmentation")
            .or_else(|| item.get("mask"))
            .and_then(segmentation_from_value),
        score: item.get("score").and_then(Value::as_f64).unwrap_or(1.0),
    }
}

fn bbox_from_value(value: &Value) -> Option<[f64; 4]> {
    let items = value.as_array()?;
    if items.len() != 4 {
        return None;
    }
    let mut bbox = [0.0; 4];
    for (slot, item) in bbox.iter_mut().zip(items) {
        *slot = item.as_f64()?;
    }
    Some(bbox)
}

fn segmentation_from_value(value: &Value) -> Option<SegmentationData> {
    serde_json::from_value(value.clone()).ok()
}

/// Reference for an object payload without a mask list: a nested URL
/// getter, else a flat string, else the unknown sentinel.
fn urls_reference(map: &serde_json::Map<String, Value>) -> String {
    match map.get("urls") {
        Some(Value::Object(urls)) => urls
            .get("get")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        Some(Value::String(url)) => url.clone(),
        _ => "unknown".to_string(),
    }
}
