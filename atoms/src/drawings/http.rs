use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use super::model::SaveDrawingPayload;
use super::service::{get_drawing, save_drawing};

/// HTTP Handler: GET /drawings?imageId={id}
pub async fn get_drawing_handler(
    client: &DynamoClient,
    table_name: &str,
    image_id: &str,
) -> Result<Response<Body>, LambdaError> {
    match get_drawing(client, table_name, image_id).await {
        Ok(drawing) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&drawing)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Drawing not found" => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
    }
}

/// HTTP Handler: POST /drawings - create or update the drawing for an image
pub async fn save_drawing_handler(
    client: &DynamoClient,
    table_name: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: SaveDrawingPayload = serde_json::from_slice(body)?;

    let (image_id, lines) = match (payload.image_id, payload.lines) {
        (Some(image_id), Some(lines)) => (image_id, lines),
        _ => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": "imageId and lines are required"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?)
        }
    };

    match save_drawing(client, table_name, &image_id, lines, payload.fills).await {
        Ok(_) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({
                    "success": true,
                    "message": "Drawing saved successfully",
                })
                .to_string()
                .into(),
            )
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("Failed to save drawing for image {}: {}", image_id, e);
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}
