use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use base64::Engine as _;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// The generative backend the engines talk to.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Returns the raw JSON text produced for `prompt` under `schema`.
    async fn generate_json(&self, prompt: &str, schema: &serde_json::Value)
    -> anyhow::Result<String>;

    /// Returns a `data:` URL holding one generated JPEG image.
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

impl GeminiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY (or API_KEY) is not set"))?;
        let api_key = api_key.trim().to_owned();
        if api_key.is_empty() {
            anyhow::bail!("GEMINI_API_KEY is empty");
        }

        let base_url = std::env::var("SEO_WIZARD_GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let text_model = std::env::var("SEO_WIZARD_TEXT_MODEL")
            .unwrap_or_else(|_| DEFAULT_TEXT_MODEL.to_owned());
        let image_model = std::env::var("SEO_WIZARD_IMAGE_MODEL")
            .unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_owned());

        Ok(Self {
            api_key,
            base_url,
            text_model,
            image_model,
        })
    }
}

pub fn model_endpoint(base_url: &str, model: &str, method: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/models/{model}:{method}")
}

#[derive(Debug, Clone)]
pub struct GeminiModel {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiModel {
    pub fn new(config: GeminiConfig) -> anyhow::Result<Self> {
        // Only the connect phase is bounded; generation calls may run arbitrarily long.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("build http client")?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    async fn post(&self, endpoint: &str, body: &serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let response = self
            .client
            .post(endpoint)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;

        let status = response.status();
        let raw = response.text().await.context("read Gemini response body")?;
        if !status.is_success() {
            let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
            anyhow::bail!("Gemini API error ({status}): {message}");
        }

        serde_json::from_str(&raw).context("parse Gemini response")
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate_json(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> anyhow::Result<String> {
        let endpoint = model_endpoint(
            &self.config.base_url,
            &self.config.text_model,
            "generateContent",
        );
        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        tracing::debug!(model = %self.config.text_model, "gemini generateContent");
        let value = self.post(&endpoint, &body).await?;
        extract_output_text(&value).context("extract output text")
    }

    async fn generate_image(&self, prompt: &str) -> anyhow::Result<String> {
        let endpoint = model_endpoint(&self.config.base_url, &self.config.image_model, "predict");
        let body = serde_json::json!({
            "instances": [ { "prompt": prompt } ],
            "parameters": {
                "sampleCount": 1,
                "outputMimeType": "image/jpeg",
                "aspectRatio": "16:9",
            },
        });

        tracing::debug!(model = %self.config.image_model, "gemini predict image");
        let value = self.post(&endpoint, &body).await?;
        extract_image_data_url(&value)
    }
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_output_text(value: &serde_json::Value) -> anyhow::Result<String> {
    let parts = value
        .pointer("/candidates/0/content/parts")
        .and_then(|v| v.as_array())
        .ok_or_else(|| anyhow::anyhow!("missing `candidates[0].content.parts` in response"))?;

    let mut text = String::new();
    for part in parts {
        let Some(part_text) = part.get("text").and_then(|v| v.as_str()) else {
            continue;
        };
        text.push_str(part_text);
    }

    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("Gemini output text is empty");
    }
    Ok(text.to_owned())
}

fn extract_image_data_url(value: &serde_json::Value) -> anyhow::Result<String> {
    let Some(encoded) = value
        .pointer("/predictions/0/bytesBase64Encoded")
        .and_then(|v| v.as_str())
    else {
        anyhow::bail!("No image was generated by the API.");
    };

    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("decode generated image bytes")?;
    Ok(format!("data:image/jpeg;base64,{encoded}"))
}
