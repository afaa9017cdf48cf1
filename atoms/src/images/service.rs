use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{GeneratedImage, Mask};

/// Gallery responses are capped so one request can't drag the whole table
/// back.
const LIST_LIMIT: usize = 100;

/// Create a new image record after a successful generation
pub async fn create_image(
    client: &DynamoClient,
    table_name: &str,
    uuid: &str,
    prompt: &str,
    image_url: &str,
) -> Result<GeneratedImage, String> {
    let now = chrono::Utc::now().to_rfc3339();
    let sk = format!("IMAGE#{}", uuid);

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S("IMAGE".to_string()))
        .item("SK", AttributeValue::S(sk))
        .item("prompt", AttributeValue::S(prompt.to_string()))
        .item("image_url", AttributeValue::S(image_url.to_string()))
        .item("created_at", AttributeValue::S(now.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(GeneratedImage {
        uuid: uuid.to_string(),
        prompt: prompt.to_string(),
        image_url: image_url.to_string(),
        masks: None,
        created_at: now,
    })
}

/// Get a single image by its external uuid
pub async fn get_image(
    client: &DynamoClient,
    table_name: &str,
    uuid: &str,
) -> Result<GeneratedImage, String> {
    let sk = format!("IMAGE#{}", uuid);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("IMAGE".to_string()))
        .key("SK", AttributeValue::S(sk))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    match result.item() {
        Some(item) => parse_image_item(uuid, item),
        None => Err("Image not found".to_string()),
    }
}

/// List images for the gallery, oldest first
pub async fn list_images(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Vec<GeneratedImage>, String> {
    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S("IMAGE".to_string()))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("IMAGE#".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB query error: {}", e))?;

    let mut images = Vec::new();
    for item in result.items() {
        if let Some(sk) = item.get("SK").and_then(|v| v.as_s().ok()) {
            if let Some(uuid) = sk.strip_prefix("IMAGE#") {
                images.push(parse_image_item(uuid, item)?);
            }
        }
    }

    images.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    images.truncate(LIST_LIMIT);

    Ok(images)
}

/// Attach segmentation masks to an existing image. The whole list is
/// replaced - a second segmentation pass overwrites, never merges.
pub async fn set_masks(
    client: &DynamoClient,
    table_name: &str,
    uuid: &str,
    masks: &[Mask],
) -> Result<(), String> {
    let sk = format!("IMAGE#{}", uuid);
    let masks_json =
        serde_json::to_string(masks).map_err(|e| format!("Failed to serialize masks: {}", e))?;

    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("IMAGE".to_string()))
        .key("SK", AttributeValue::S(sk))
        .update_expression("SET masks = :masks")
        .expression_attribute_values(":masks", AttributeValue::S(masks_json))
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;

    Ok(())
}

fn parse_image_item(
    uuid: &str,
    item: &HashMap<String, AttributeValue>,
) -> Result<GeneratedImage, String> {
    let masks = match item.get("masks").and_then(|v| v.as_s().ok()) {
        Some(raw) => {
            Some(serde_json::from_str(raw).map_err(|e| format!("Failed to parse masks: {}", e))?)
        }
        None => None,
    };

    Ok(GeneratedImage {
        uuid: uuid.to_string(),
        prompt: item
            .get("prompt")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        image_url: item
            .get("image_url")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        masks,
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}
