//! Gemini `streamGenerateContent` client.

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use tracing::Instrument;
use uuid::Uuid;

use super::sse::GeminiSseParser;
use crate::config::Config;
use crate::providers::shared::{USER_AGENT, classify_reqwest_error};
use crate::providers::{
    ChatModel, ChatRequest, FragmentStream, ProviderError, ProviderResult, resolve_api_key,
    resolve_base_url,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini API configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_output_tokens: Option<u32>,
}

impl GeminiConfig {
    /// Creates a new config from explicit values and the environment.
    ///
    /// Authentication resolution order:
    /// 1. `config_api_key` parameter (from config file)
    /// 2. `GEMINI_API_KEY` environment variable
    ///
    /// Environment variables:
    /// - `GEMINI_API_KEY` (fallback if not in config)
    /// - `GEMINI_BASE_URL` (optional, wins over config)
    ///
    /// # Errors
    /// Returns an error if no API key is available or the base URL is invalid.
    pub fn from_env(
        model: String,
        max_output_tokens: Option<u32>,
        config_base_url: Option<&str>,
        config_api_key: Option<&str>,
    ) -> Result<Self> {
        let api_key = resolve_api_key(config_api_key, "GEMINI_API_KEY", "gemini")?;
        let base_url = resolve_base_url(
            config_base_url,
            "GEMINI_BASE_URL",
            DEFAULT_BASE_URL,
            "Gemini",
        )?;

        Ok(Self {
            api_key,
            base_url,
            model,
            max_output_tokens,
        })
    }

    /// Builds the client config from the loaded user config.
    ///
    /// # Errors
    /// Returns an error if no API key is available or the base URL is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_env(
            config.model.clone(),
            config.max_tokens,
            config.gemini.effective_base_url(),
            config.gemini.effective_api_key(),
        )
    }
}

/// Gemini client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Opens a streaming reply for `request`.
    ///
    /// # Errors
    /// Returns a provider error if the request cannot be sent or the
    /// server answers with a non-success status.
    pub async fn send_stream(&self, request: &ChatRequest) -> ProviderResult<FragmentStream> {
        let body = build_request(request, self.config.max_output_tokens);
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url, self.config.model
        );
        let headers = build_headers(&self.config.api_key);
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!("gemini_request", %request_id, model = %self.config.model);

        async move {
            tracing::debug!(history = request.history.len(), "opening stream");
            let response = self
                .http
                .post(&url)
                .headers(headers)
                .json(&body)
                .send()
                .await
                .map_err(|e| classify_reqwest_error(&e))?;

            let status = response.status();
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                return Err(ProviderError::http_status(status.as_u16(), &error_body));
            }

            let bytes = Box::pin(response.bytes_stream());
            let stream: FragmentStream = Box::pin(GeminiSseParser::new(bytes));
            Ok(stream)
        }
        .instrument(span)
        .await
    }
}

impl ChatModel for GeminiClient {
    async fn stream_reply(&self, request: ChatRequest) -> ProviderResult<FragmentStream> {
        self.send_stream(&request).await
    }
}

/// Builds the `streamGenerateContent` request body.
///
/// History turns come first, in order, followed by the new user message.
fn build_request(request: &ChatRequest, max_output_tokens: Option<u32>) -> Value {
    let mut contents = Vec::with_capacity(request.history.len() * 2 + 1);
    for exchange in &request.history {
        contents.push(text_content("user", &exchange.user));
        contents.push(text_content("model", &exchange.model));
    }
    contents.push(text_content("user", &request.message));

    let mut body = json!({ "contents": contents });

    if let Some(instruction) = request.system_instruction.as_deref()
        && !instruction.trim().is_empty()
    {
        body["systemInstruction"] = json!({ "parts": [{ "text": instruction }] });
    }

    if let Some(max) = max_output_tokens {
        body["generationConfig"] = json!({ "maxOutputTokens": max });
    }

    body
}

fn text_content(role: &str, text: &str) -> Value {
    json!({ "role": role, "parts": [{ "text": text }] })
}

fn build_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-goog-api-key",
        HeaderValue::from_str(api_key).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers.insert("accept", HeaderValue::from_static("text/event-stream"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}
