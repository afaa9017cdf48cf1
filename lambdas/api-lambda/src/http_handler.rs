use colorbook_atoms as atoms;
use colorbook_shared::{generation, segmentation, AppState};
use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use std::env;
use std::sync::Arc;

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

/// Main Lambda handler - routes requests to the generation, segmentation,
/// image and drawing endpoints
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    tracing::info!("🚀 API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == "OPTIONS" {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "colorbook".to_string());

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        // POST /generate - generate a coloring page from a prompt
        (&Method::POST, ["generate"]) => {
            generation::generate_handler(state.clone(), &table_name, body).await
        }

        // POST /segment - segment an image into fillable regions
        (&Method::POST, ["segment"]) => {
            segmentation::segment_handler(state.clone(), &table_name, body).await
        }

        // GET /images?uuid={id} - one image; GET /images - gallery list
        (&Method::GET, ["images"]) => {
            let params = event.query_string_parameters();
            match params.first("uuid") {
                Some(uuid) => {
                    atoms::images::get_image_handler(&state.dynamo_client, &table_name, uuid).await
                }
                None => {
                    atoms::images::list_images_handler(&state.dynamo_client, &table_name).await
                }
            }
        }

        // POST /images - create an image record
        (&Method::POST, ["images"]) => {
            atoms::images::create_image_handler(&state.dynamo_client, &table_name, body).await
        }

        // GET /drawings?imageId={id} - the saved drawing for an image
        (&Method::GET, ["drawings"]) => {
            let params = event.query_string_parameters();
            match params.first("imageId") {
                Some(image_id) => {
                    atoms::drawings::get_drawing_handler(&state.dynamo_client, &table_name, image_id)
                        .await
                }
                None => Ok(Response::builder()
                    .status(StatusCode::BAD_REQUEST)
                    .header("Content-Type", "application/json")
                    .body(
                        serde_json::json!({"error": "imageId is required"})
                            .to_string()
                            .into(),
                    )
                    .map_err(Box::new)?),
            }
        }

        // POST /drawings - create or update a drawing
        (&Method::POST, ["drawings"]) => {
            atoms::drawings::save_drawing_handler(&state.dynamo_client, &table_name, body).await
        }

        _ => {
            tracing::warn!("⚠️ No route matched - Method: {} Path: {}", method, path);
            Ok(Response::builder()
                .status(StatusCode::NOT_FOUND)
                .header("Content-Type", "application/json")
                .body(serde_json::json!({"error": "Not found"}).to_string().into())
                .map_err(Box::new)?)
        }
    };

    resp.map(with_cors_headers)
}
