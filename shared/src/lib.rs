use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

pub mod generation;
pub mod replicate;
pub mod segmentation;
pub mod types;

/// Clients built once at cold start and shared across invocations.
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        AppState {
            dynamo_client: DynamoClient::new(config),
            http_client: reqwest::Client::new(),
        }
    }
}

/// Build a JSON response with the CORS header every endpoint carries.
pub fn json_response(
    status: StatusCode,
    body: serde_json::Value,
) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(body.to_string().into())
        .map_err(Box::new)?)
}
