/// Client for the remote face-comparison API.
///
/// The API receives two base64 images as a multipart form and answers with a
/// JSON body carrying either a `confidence` score (0-100) or an
/// `error_message`. Every failure mode counts as "no match".
use crate::error::FaceError;
use reqwest::multipart::Form;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_COMPARE_URL: &str = "https://api-us.faceplusplus.com/facepp/v3/compare";

/// Confidence strictly above this value is a match.
pub const MATCH_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone)]
pub struct FaceApiConfig {
    pub compare_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub timeout: Duration,
}

impl Default for FaceApiConfig {
    fn default() -> Self {
        FaceApiConfig {
            compare_url: DEFAULT_COMPARE_URL.to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct FaceClient {
    client: Client,
    config: FaceApiConfig,
}

impl FaceClient {
    pub fn new(config: FaceApiConfig) -> Result<Self, FaceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(FaceClient { client, config })
    }

    /// Decide whether `captured` shows the same person as `reference`.
    /// A single attempt; transport and parse failures yield `false`.
    pub async fn compare(&self, reference: &str, captured: &str) -> bool {
        match self.request(reference, captured).await {
            Ok(body) => decide(&body),
            Err(e) => {
                log::error!("Face comparison failed: {}", e);
                false
            }
        }
    }

    async fn request(&self, reference: &str, captured: &str) -> Result<Value, FaceError> {
        if self.config.api_key.is_empty() || self.config.api_secret.is_empty() {
            return Err(FaceError::MissingCredentials);
        }

        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("api_secret", self.config.api_secret.clone())
            .text("image_base64_1", reference.to_string())
            .text("image_base64_2", captured.to_string());

        // Error responses still carry a JSON body, so the status is not checked here.
        let response = self
            .client
            .post(&self.config.compare_url)
            .multipart(form)
            .send()
            .await?;
        let text = response.text().await?;
        log::debug!("Face API response: {}", text);

        Ok(serde_json::from_str(&text)?)
    }
}

/// Interpret a comparison response body.
pub fn decide(body: &Value) -> bool {
    if let Some(message) = body.get("error_message") {
        log::warn!("Face API reported an error: {}", message);
        return false;
    }

    match body.get("confidence").and_then(Value::as_f64) {
        Some(confidence) => {
            log::info!("Face match confidence: {:.2}", confidence);
            confidence > MATCH_THRESHOLD
        }
        None => {
            log::warn!("Face API response carried no confidence");
            false
        }
    }
}
