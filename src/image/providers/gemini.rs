//! Gemini (Google) image generation provider.

use crate::config::{resolve_api_key, Config, API_KEY_ENV_VARS};
use crate::error::{parse_retry_after, sanitize_error_message, EmbraceError, Result};
use crate::image::provider::ImageProvider;
use crate::image::request::{GenerationRequest, RequestPart};
use crate::image::response::GenerationResponse;
use async_trait::async_trait;
use serde::Serialize;

/// Public Gemini API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini image model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeminiModel {
    /// Nano Banana - Gemini 2.5 Flash Image (fast, economical).
    #[default]
    NanoBanana,
    /// Nano Banana Pro - Gemini 3 Pro Image (highest quality).
    NanoBananaPro,
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NanoBanana => "gemini-2.5-flash-image",
            Self::NanoBananaPro => "nano-banana-pro-preview",
        }
    }
}

impl std::str::FromStr for GeminiModel {
    type Err = EmbraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini-2.5-flash-image" | "nano-banana" | "flash" => Ok(Self::NanoBanana),
            "nano-banana-pro-preview" | "nano-banana-pro" | "pro" => Ok(Self::NanoBananaPro),
            other => Err(EmbraceError::InvalidRequest(format!(
                "unknown Gemini image model: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for GeminiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for GeminiProvider.
#[derive(Debug, Clone, Default)]
pub struct GeminiProviderBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
}

impl GeminiProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `API_KEY`, `GEMINI_API_KEY`, then `GOOGLE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the provider, resolving the API key.
    pub fn build(self) -> Result<GeminiProvider> {
        self.build_with(|name| std::env::var(name).ok())
    }

    fn build_with(self, lookup: impl Fn(&str) -> Option<String>) -> Result<GeminiProvider> {
        let api_key = self
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .or_else(|| resolve_api_key(lookup))
            .ok_or_else(|| {
                EmbraceError::Auth(format!(
                    "{} not set and no API key provided",
                    API_KEY_ENV_VARS[0]
                ))
            })?;

        Ok(GeminiProvider {
            client: reqwest::Client::new(),
            api_key,
            model: self.model,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Gemini image generation provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    /// Creates a new `GeminiProviderBuilder`.
    pub fn builder() -> GeminiProviderBuilder {
        GeminiProviderBuilder::new()
    }

    /// Builds a provider from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Self::builder()
            .model(config.model)
            .base_url(config.base_url.clone());
        match &config.api_key {
            Some(key) => builder = builder.api_key(key.clone()),
            None => {
                return Err(EmbraceError::Auth(format!(
                    "{} not set and no API key provided",
                    API_KEY_ENV_VARS[0]
                )))
            }
        }
        builder.build_with(|_| None)
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model.as_str())
    }

    async fn generate_impl(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let url = format!("{}:generateContent", self.model_url());
        let body = GeminiRequest::from_generation_request(request);

        tracing::debug!(
            model = self.model.as_str(),
            childhood_mime = %request.childhood().mime_type,
            recent_mime = %request.recent().mime_type,
            "sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(parse_error(status.as_u16(), &text, &headers));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> EmbraceError {
    let text = sanitize_error_message(text);
    if status == 404 {
        return EmbraceError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        );
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return EmbraceError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return EmbraceError::Auth(text);
    }
    let lower = text.to_lowercase();
    if lower.contains("safety")
        || lower.contains("blocked")
        || lower.contains("prohibited")
    {
        return EmbraceError::ContentBlocked(text);
    }
    EmbraceError::Api {
        status,
        message: text,
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    fn ensure_credentials(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(EmbraceError::Auth("API key is empty".into()));
        }
        Ok(())
    }

    async fn generate_content(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.generate_impl(request).await
    }

    fn model(&self) -> &str {
        self.model.as_str()
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        match response.status().as_u16() {
            401 | 403 => Err(EmbraceError::Auth("Invalid API key".into())),
            404 => Err(EmbraceError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )),
            s if !(200..300).contains(&s) => Err(EmbraceError::Api {
                status: s,
                message: "Health check failed".into(),
            }),
            _ => Ok(()),
        }
    }
}

// Request types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiRequestPart<'a>>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart<'a> {
    Text { text: &'a str },
    InlineData { inline_data: GeminiInlineData<'a> },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<&'static str>,
}

impl<'a> GeminiRequest<'a> {
    fn from_generation_request(req: &'a GenerationRequest) -> Self {
        let parts = req
            .parts()
            .into_iter()
            .map(|part| match part {
                RequestPart::InlineImage(image) => GeminiRequestPart::InlineData {
                    inline_data: GeminiInlineData {
                        mime_type: &image.mime_type,
                        data: &image.data,
                    },
                },
                RequestPart::Text(text) => GeminiRequestPart::Text { text },
            })
            .collect();

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: req
                    .response_modalities()
                    .iter()
                    .map(|m| m.as_str())
                    .collect(),
            },
        }
    }
}
