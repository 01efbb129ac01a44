//! Provider-agnostic types shared by the chat loop and model backends.

use std::fmt;
use std::future::Future;

use anyhow::{Context, Result};
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::conversation::Exchange;

/// Standard User-Agent header for gemchat API requests.
pub const USER_AGENT: &str = concat!("gemchat/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Config resolution helpers
// ============================================================================

/// Resolves an API key with precedence: config > env.
///
/// # Arguments
/// * `config_api_key` - Value from config file (if present)
/// * `env_var` - Environment variable name (e.g., "`GEMINI_API_KEY`")
/// * `config_section` - Config section name (e.g., "gemini")
///
/// # Errors
/// Returns an error if neither source provides a non-empty key.
pub fn resolve_api_key(
    config_api_key: Option<&str>,
    env_var: &str,
    config_section: &str,
) -> Result<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    let from_env = std::env::var(env_var).unwrap_or_default();
    let trimmed = from_env.trim();
    if trimmed.is_empty() {
        anyhow::bail!("No API key available. Set {env_var} or api_key in [{config_section}].");
    }
    Ok(trimmed.to_string())
}

/// Resolves a base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the chosen URL does not parse.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    provider_name: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.trim_end_matches('/').to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str, provider_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {provider_name} base URL: {url}"))?;
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Categories of provider errors for consistent error handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// HTTP status error (4xx, 5xx) or a request that never got a response
    HttpStatus,
    /// Connection timeout or request timeout
    Timeout,
    /// Failed to parse response (JSON parse error, invalid SSE, etc.)
    Parse,
    /// API-level error returned by the provider inside the stream
    ApiError,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::HttpStatus => write!(f, "http_status"),
            ProviderErrorKind::Timeout => write!(f, "timeout"),
            ProviderErrorKind::Parse => write!(f, "parse"),
            ProviderErrorKind::ApiError => write!(f, "api_error"),
        }
    }
}

/// Structured error from the provider with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderError {
    /// Error category
    pub kind: ProviderErrorKind,
    /// One-line summary suitable for logs
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, pulling `error.message` out of a JSON body when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        if body.is_empty() {
            return Self::new(ProviderErrorKind::HttpStatus, format!("HTTP {status}"));
        }

        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .map(|msg| format!("HTTP {status}: {msg}"))
            })
            .unwrap_or_else(|| format!("HTTP {status}"));

        Self {
            kind: ProviderErrorKind::HttpStatus,
            message,
            details: Some(body.to_string()),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, message)
    }

    /// Creates an API error (from a mid-stream error payload).
    pub fn api_error(error_type: &str, message: &str) -> Self {
        Self::new(ProviderErrorKind::ApiError, format!("{error_type}: {message}"))
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Maps a reqwest transport error onto a provider error kind.
pub fn classify_reqwest_error(e: &reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::timeout(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Request error: {e}"))
    } else {
        ProviderError::new(ProviderErrorKind::HttpStatus, format!("Network error: {e}"))
    }
}

// ============================================================================
// Model seam
// ============================================================================

/// Everything a backend needs to generate one reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    /// Standing instruction sent with every request.
    pub system_instruction: Option<String>,
    /// Completed exchanges that precede `message`, oldest first.
    pub history: Vec<Exchange>,
    /// The text just submitted.
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_system_instruction(mut self, instruction: Option<String>) -> Self {
        self.system_instruction = instruction;
        self
    }
}

/// Lazy, finite sequence of text fragments. Any item may be an error.
pub type FragmentStream = BoxStream<'static, ProviderResult<String>>;

/// A model backend that streams a reply as text fragments.
///
/// Opening the stream may fail (no fragments at all); a stream may also
/// yield an error after some fragments.
pub trait ChatModel: Send + Sync {
    fn stream_reply(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = ProviderResult<FragmentStream>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_extracts_json_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        let err = ProviderError::http_status(400, body);
        assert_eq!(err.kind, ProviderErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP 400: API key not valid");
        assert_eq!(err.details.as_deref(), Some(body));
    }

    #[test]
    fn test_http_status_plain_body() {
        let err = ProviderError::http_status(503, "upstream down");
        assert_eq!(err.message, "HTTP 503");
        assert_eq!(err.details.as_deref(), Some("upstream down"));

        let empty = ProviderError::http_status(500, "");
        assert!(empty.details.is_none());
    }

    #[test]
    fn test_resolve_api_key_prefers_config() {
        let key = resolve_api_key(Some("  from-config  "), "GEMCHAT_TEST_UNSET_KEY", "gemini")
            .unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_resolve_api_key_missing_everywhere_errors() {
        let err = resolve_api_key(Some("   "), "GEMCHAT_TEST_UNSET_KEY", "gemini").unwrap_err();
        assert!(err.to_string().contains("GEMCHAT_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_resolve_base_url_rejects_garbage() {
        let result = resolve_base_url(
            Some("not a url"),
            "GEMCHAT_TEST_UNSET_URL",
            "https://example.com",
            "Gemini",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_base_url_falls_back_to_default() {
        let url = resolve_base_url(
            None,
            "GEMCHAT_TEST_UNSET_URL",
            "https://example.com/v1",
            "Gemini",
        )
        .unwrap();
        assert_eq!(url, "https://example.com/v1");
    }
}
