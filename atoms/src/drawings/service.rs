use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use super::model::{Drawing, Fill, Stroke};

/// Get the saved drawing for an image
pub async fn get_drawing(
    client: &DynamoClient,
    table_name: &str,
    image_id: &str,
) -> Result<Drawing, String> {
    let pk = format!("IMAGE#{}", image_id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk))
        .key("SK", AttributeValue::S("DRAWING".to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB get_item error: {}", e))?;

    match result.item() {
        Some(item) => parse_drawing_item(image_id, item),
        None => Err("Drawing not found".to_string()),
    }
}

/// Save the drawing for an image - update the existing row or insert a new
/// one. The read-then-write window means two concurrent first saves race;
/// the later write wins, which the whole-document overwrite makes safe.
/// An update that carries no fills keeps the fills already stored.
pub async fn save_drawing(
    client: &DynamoClient,
    table_name: &str,
    image_id: &str,
    lines: Vec<Stroke>,
    fills: Option<Vec<Fill>>,
) -> Result<Drawing, String> {
    let now = chrono::Utc::now().to_rfc3339();
    let pk = format!("IMAGE#{}", image_id);

    let existing = match get_drawing(client, table_name, image_id).await {
        Ok(drawing) => Some(drawing),
        Err(e) if e == "Drawing not found" => None,
        Err(e) => return Err(e),
    };

    let (fills, created_at) = match existing {
        Some(prev) => (fills.unwrap_or(prev.fills), prev.created_at),
        None => (fills.unwrap_or_default(), now.clone()),
    };

    let lines_json =
        serde_json::to_string(&lines).map_err(|e| format!("Failed to serialize lines: {}", e))?;
    let fills_json =
        serde_json::to_string(&fills).map_err(|e| format!("Failed to serialize fills: {}", e))?;

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk))
        .item("SK", AttributeValue::S("DRAWING".to_string()))
        .item("lines", AttributeValue::S(lines_json))
        .item("fills", AttributeValue::S(fills_json))
        .item("created_at", AttributeValue::S(created_at.clone()))
        .item("updated_at", AttributeValue::S(now.clone()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB put_item error: {}", e))?;

    Ok(Drawing {
        image_id: image_id.to_string(),
        lines,
        fills,
        created_at,
        updated_at: now,
    })
}

fn parse_drawing_item(
    image_id: &str,
    item: &HashMap<String, AttributeValue>,
) -> Result<Drawing, String> {
    let lines_str = item
        .get("lines")
        .and_then(|v| v.as_s().ok())
        .ok_or("Missing lines")?;
    let lines: Vec<Stroke> =
        serde_json::from_str(lines_str).map_err(|e| format!("Failed to parse lines: {}", e))?;

    let fills: Vec<Fill> = match item.get("fills").and_then(|v| v.as_s().ok()) {
        Some(raw) => {
            serde_json::from_str(raw).map_err(|e| format!("Failed to parse fills: {}", e))?
        }
        None => Vec::new(),
    };

    Ok(Drawing {
        image_id: image_id.to_string(),
        lines,
        fills,
        created_at: item
            .get("created_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        updated_at: item
            .get("updated_at")
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}
