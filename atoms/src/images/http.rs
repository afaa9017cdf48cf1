use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error as LambdaError, Response};

use super::model::CreateImagePayload;
use super::service::{create_image, get_image, list_images};

/// HTTP Handler: GET /images?uuid={id}
pub async fn get_image_handler(
    client: &DynamoClient,
    table_name: &str,
    uuid: &str,
) -> Result<Response<Body>, LambdaError> {
    match get_image(client, table_name, uuid).await {
        Ok(image) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&image)?.into())
            .map_err(Box::new)?),
        Err(e) if e == "Image not found" => Ok(Response::builder()
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

/// HTTP Handler: GET /images
pub async fn list_images_handler(
    client: &DynamoClient,
    table_name: &str,
) -> Result<Response<Body>, LambdaError> {
    match list_images(client, table_name).await {
        Ok(images) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&images)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("Failed to list images: {}", e);
            Ok(Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(serde_json::json!({"error": e}).to_string().into())
                .map_err(Box::new)?)
        }
    }
}

/// HTTP Handler: POST /images - manual insert path for records whose image
/// already exists externally
pub async fn create_image_handler(
    client: &DynamoClient,
    table_name: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let payload: CreateImagePayload = serde_json::from_slice(body)?;

    let (prompt, image_url) = match (payload.prompt, payload.image_url) {
        (Some(prompt), Some(image_url)) => (prompt, image_url),
        _ => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header("Content-Type", "application/json")
                .header("Access-Control-Allow-Origin", "*")
                .body(
                    serde_json::json!({"error": "prompt and imageUrl are required"})
                        .to_string()
                        .into(),
                )
                .map_err(Box::new)?)
        }
    };

    let uuid = payload
        .uuid
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::info!("Creating image record: uuid={}, prompt={}", uuid, prompt);

    match create_image(client, table_name, &uuid, &prompt, &image_url).await {
        Ok(image) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&image)?.into())
            .map_err(Box::new)?),
        Err(e) => Ok(Response::builder()
            .status(StatusCode::INTERNAL_SERVER_ERROR)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::json!({"error": e}).to_string().into())
            .map_err(Box::new)?),
    }
}
