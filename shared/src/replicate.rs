use serde_json::Value;
use std::time::{Duration, Instant};

const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const POLL_TIMEOUT: Duration = Duration::from_secs(120);

/// Minimal Replicate REST client: create a prediction against a pinned
/// model version, wait for a terminal status, hand back the output.
pub struct ReplicateClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl ReplicateClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        let api_base = std::env::var("REPLICATE_API_BASE")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        ReplicateClient {
            http,
            api_base,
            token,
        }
    }

    /// The API token, or None when unset/blank - callers turn that into a
    /// configuration error on the request that needed it.
    pub fn token_from_env() -> Option<String> {
        std::env::var("REPLICATE_API_TOKEN")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Create a prediction and wait for it to finish, returning its
    /// `output` payload. `Prefer: wait` usually resolves synchronously;
    /// predictions still starting are polled via their `urls.get` link.
    pub async fn run(&self, version: &str, input: Value) -> Result<Value, String> {
        let endpoint = format!("{}/predictions", self.api_base);
        let payload = serde_json::json!({ "version": version, "input": input });

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.token)
            .header("Prefer", "wait")
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("Replicate request failed ({}): {}", endpoint, e))?;
        let mut prediction = response_json(response).await?;

        if !is_terminal(&prediction) {
            let poll_url = prediction
                .get("urls")
                .and_then(|urls| urls.get("get"))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .ok_or_else(|| "Replicate prediction missing poll URL".to_string())?
                .to_string();
            prediction = self.poll_prediction(&poll_url).await?;
        }

        prediction_output(prediction)
    }

    async fn poll_prediction(&self, poll_url: &str) -> Result<Value, String> {
        let started = Instant::now();
        loop {
            let response = self
                .http
                .get(poll_url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|e| format!("Replicate poll request failed ({}): {}", poll_url, e))?;
            let prediction = response_json(response).await?;

            if is_terminal(&prediction) {
                return Ok(prediction);
            }
            if started.elapsed() >= POLL_TIMEOUT {
                return Err(format!(
                    "Replicate polling timed out after {}s",
                    POLL_TIMEOUT.as_secs()
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

fn status(prediction: &Value) -> String {
    prediction
        .get("status")
        .and_then(Value::as_str)
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default()
}

fn is_terminal(prediction: &Value) -> bool {
    matches!(status(prediction).as_str(), "succeeded" | "failed" | "canceled")
}

/// Output of a finished prediction; anything but success surfaces the whole
/// prediction body for diagnostics.
fn prediction_output(prediction: Value) -> Result<Value, String> {
    if status(&prediction) == "succeeded" {
        Ok(prediction.get("output").cloned().unwrap_or(Value::Null))
    } else {
        Err(format!("Replicate prediction failed: {}", prediction))
    }
}

async fn response_json(response: reqwest::Response) -> Result<Value, String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| format!("Failed to read Replicate response: {}", e))?;
    if !status.is_success() {
        return Err(format!("Replicate API error ({}): {}", status.as_u16(), body));
    }
    serde_json::from_str(&body).map_err(|e| format!("Failed to parse Replicate response: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn succeeded_predictions_yield_their_output() {
        let prediction = json!({
            "status": "succeeded",
            "output": ["https://replicate.delivery/pbxt/abc/out.png"],
        });
        let output = prediction_output(prediction).unwrap();
        assert_eq!(output[0], "https://replicate.delivery/pbxt/abc/out.png");
    }

    #[test]
    fn succeeded_without_output_yields_null_rather_than_an_error() {
        let output = prediction_output(json!({"status": "succeeded"})).unwrap();
        assert!(output.is_null());
    }

    #[test]
    fn failed_and_canceled_predictions_surface_the_body() {
        let err = prediction_output(json!({"status": "failed", "error": "NSFW"})).unwrap_err();
        assert!(err.contains("Replicate prediction failed"));
        assert!(err.contains("NSFW"));

        assert!(prediction_output(json!({"status": "canceled"})).is_err());
    }

    #[test]
    fn terminal_status_detection_is_case_insensitive() {
        assert!(is_terminal(&json!({"status": "SUCCEEDED"})));
        assert!(is_terminal(&json!({"status": "failed"})));
        assert!(!is_terminal(&json!({"status": "processing"})));
        assert!(!is_terminal(&json!({"status": "starting"})));
        assert!(!is_terminal(&json!({})));
    }
}
