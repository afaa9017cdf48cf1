use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use colorbook_atoms::images::service as images;

use crate::replicate::ReplicateClient;
use crate::{json_response, segmentation, AppState};

/// Pinned SDXL fine-tune that produces line-art coloring pages.
const MODEL_VERSION: &str = "cbaf592788a0513ff5ca3beecdc0d9280fb44908771656f2adef630a263d9ebe";
const NEGATIVE_PROMPT: &str = "complex, realistic, color, gradient";
const NUM_INFERENCE_STEPS: u32 = 25;
const GUIDANCE_SCALE: f64 = 7.5;

const MAX_ATTEMPTS: u32 = 2;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Style wrapper applied to every user prompt. TOK is the fine-tune's
/// trigger token.
fn style_prompt(prompt: &str) -> String {
    format!(
        "a picture of TOK {} coloring book vintage minimal lines easy to color",
        prompt
    )
}

#[derive(Debug, Deserialize)]
struct GeneratePayload {
    prompt: Option<String>,
}

/// The output shapes Replicate has been observed to return for an image
/// prediction. `classify` maps a raw payload onto exactly one variant;
/// `Unrecognized` keeps the payload for diagnostics.
#[derive(Debug)]
pub enum GenerationOutput {
    /// A bare URL string.
    Url(String),
    /// An array whose first element is the URL.
    FirstOfList(String),
    /// An object with a non-empty `output` array of URLs.
    OutputField(String),
    /// An array whose head is not a string - the output is still streaming
    /// and no URL has materialized.
    Pending(Value),
    /// An object with a string `image` field.
    ImageField(String),
    Unrecognized(Value),
}

impl GenerationOutput {
    pub fn classify(output: Value) -> GenerationOutput {
        match output {
            Value::String(url) => GenerationOutput::Url(url),
            Value::Array(items) => match items.first() {
                Some(Value::String(url)) => GenerationOutput::FirstOfList(url.clone()),
                Some(_) => GenerationOutput::Pending(Value::Array(items)),
                None => GenerationOutput::Unrecognized(Value::Array(items)),
            },
            Value::Object(map) => {
                if let Some(Value::Array(output)) = map.get("output") {
                    if let Some(Value::String(url)) = output.first() {
                        return GenerationOutput::OutputField(url.clone());
                    }
                }
                if let Some(Value::String(image)) = map.get("image") {
                    return GenerationOutput::ImageField(image.clone());
                }
                GenerationOutput::Unrecognized(Value::Object(map))
            }
            other => GenerationOutput::Unrecognized(other),
        }
    }

    /// Total: every variant yields a displayable URL. Synthesized
    /// placeholders come back flagged so callers can tell them from real
    /// results; `token` keys the placeholder deterministically to the image.
    pub fn resolve(self, token: &str) -> ResolvedImage {
        match self {
            GenerationOutput::Url(url)
            | GenerationOutput::FirstOfList(url)
            | GenerationOutput::OutputField(url)
            | GenerationOutput::ImageField(url) => ResolvedImage {
                url,
                degraded: false,
            },
            GenerationOutput::Pending(raw) => {
                tracing::warn!("Replicate output still streaming, using placeholder: {}", raw);
                ResolvedImage {
                    url: format!("https://replicate-output-{}.png", token),
                    degraded: true,
                }
            }
            GenerationOutput::Unrecognized(raw) => {
                tracing::warn!("Unrecognized Replicate output shape, using placeholder: {}", raw);
                ResolvedImage {
                    url: format!("https://placehold.co/600x600/png?text={}", token),
                    degraded: true,
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct ResolvedImage {
    pub url: String,
    pub degraded: bool,
}

/// HTTP Handler: POST /generate
///
/// Generates the image, persists the record, then kicks segmentation off in
/// the background - the response never waits for masks.
pub async fn generate_handler(
    state: Arc<AppState>,
    table_name: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: GeneratePayload = serde_json::from_slice(body)?;

    let prompt = match payload
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        Some(p) => p.to_string(),
        None => {
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({"error": "Prompt is required"}),
            )
        }
    };

    let Some(token) = ReplicateClient::token_from_env() else {
        return json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "Replicate API token is not configured"}),
        );
    };
    let replicate = ReplicateClient::new(state.http_client.clone(), token);

    tracing::info!("🎨 Sending request to Replicate with prompt: {}", prompt);

    let input = json!({
        "prompt": style_prompt(&prompt),
        "negative_prompt": NEGATIVE_PROMPT,
        "num_inference_steps": NUM_INFERENCE_STEPS,
        "guidance_scale": GUIDANCE_SCALE,
    });

    let mut output = Value::Null;
    for attempt in 1..=MAX_ATTEMPTS {
        tracing::info!("Attempt {} of {} to generate image", attempt, MAX_ATTEMPTS);
        match replicate.run(MODEL_VERSION, input.clone()).await {
            Ok(value) => {
                output = value;
                break;
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                tracing::error!("Error on attempt {}: {}", attempt, e);
                tokio::time::sleep(RETRY_PAUSE).await;
            }
            Err(e) => {
                tracing::error!("Error generating image: {}", e);
                return json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": format!("Failed to generate image: {}", e)}),
                );
            }
        }
    }

    // the uuid doubles as the placeholder token, so a degraded URL is
    // deterministic per image
    let uuid = uuid::Uuid::new_v4().to_string();
    let resolved = GenerationOutput::classify(output).resolve(&uuid);
    tracing::info!("Extracted image URL: {}", resolved.url);

    let mut response = json!({
        "uuid": uuid,
        "imageUrl": resolved.url,
        "prompt": prompt,
    });
    if resolved.degraded {
        response["placeholder"] = Value::Bool(true);
    }

    match images::create_image(&state.dynamo_client, table_name, &uuid, &prompt, &resolved.url)
        .await
    {
        Ok(_) => {
            tracing::info!("✅ Saved image {} to database", uuid);
            spawn_segmentation(
                state.clone(),
                table_name.to_string(),
                resolved.url.clone(),
                uuid.clone(),
            );
        }
        Err(e) => {
            // the image exists externally even if bookkeeping failed - hand
            // the result back flagged as unsaved
            tracing::error!("Database error: {}", e);
            response["dbError"] = Value::Bool(true);
        }
    }

    json_response(StatusCode::OK, response)
}

/// Start segmentation without blocking the response. The task owns its own
/// failure channel: errors are logged and never cancel or roll back the
/// image that was just persisted.
fn spawn_segmentation(state: Arc<AppState>, table_name: String, image_url: String, image_id: String) {
    tokio::spawn(async move {
        if let Err(e) =
            segmentation::run_segmentation(&state, &table_name, &image_url, Some(&image_id)).await
        {
            tracing::error!("Error starting segmentation for image {}: {}", image_id, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(value: Value) -> ResolvedImage {
        GenerationOutput::classify(value).resolve("test-token")
    }

    #[test]
    fn bare_string_is_used_directly() {
        let resolved = resolve(json!("https://replicate.delivery/out.png"));
        assert_eq!(resolved.url, "https://replicate.delivery/out.png");
        assert!(!resolved.degraded);
    }

    #[test]
    fn array_with_string_head_uses_the_first_element() {
        let resolved = resolve(json!(["https://a.png", "https://b.png"]));
        assert_eq!(resolved.url, "https://a.png");
        assert!(!resolved.degraded);
    }

    #[test]
    fn object_with_output_array_uses_its_first_element() {
        let resolved = resolve(json!({"output": ["https://a.png"], "image": "https://b.png"}));
        assert_eq!(resolved.url, "https://a.png");
        assert!(!resolved.degraded);
    }

    #[test]
    fn object_with_image_field_is_used_when_no_output_array() {
        let resolved = resolve(json!({"image": "https://b.png"}));
        assert_eq!(resolved.url, "https://b.png");
        assert!(!resolved.degraded);
    }

    #[test]
    fn streaming_array_head_synthesizes_a_flagged_placeholder() {
        let resolved = resolve(json!([{"locked": true}]));
        assert_eq!(resolved.url, "https://replicate-output-test-token.png");
        assert!(resolved.degraded);
    }

    #[test]
    fn unrecognized_shapes_synthesize_a_flagged_placeholder() {
        for value in [json!(null), json!(42), json!({}), json!({"output": []}), json!([])] {
            let resolved = resolve(value);
            assert_eq!(
                resolved.url,
                "https://placehold.co/600x600/png?text=test-token"
            );
            assert!(resolved.degraded);
        }
    }

    #[test]
    fn normalization_is_total_and_never_yields_an_empty_url() {
        let shapes = [
            json!("https://a.png"),
            json!(["https://a.png"]),
            json!({"output": ["https://a.png"]}),
            json!({"image": "https://a.png"}),
            json!([{"pending": true}]),
            json!({"unexpected": "shape"}),
            json!(null),
        ];
        for shape in shapes {
            assert!(!resolve(shape).url.is_empty());
        }
    }

    #[test]
    fn style_prompt_wraps_the_user_prompt() {
        let styled = style_prompt("a cute cat");
        assert!(styled.contains("TOK a cute cat"));
        assert!(styled.contains("coloring book"));
    }
}
